use std::{cell::RefCell, rc::Rc};

use crate::{
    animation::tween::Tween,
    foundation::{
        core::{DraftId, Millis, Point, Rect},
        error::EdgeFxResult,
    },
    runtime::event_loop::{EventLoop, TimerId},
};

/// What a render command addresses.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Target {
    /// The document root.
    Root,
    /// A scene element by id.
    Element { id: String },
    /// The drawing surface laid over a draft's element.
    Surface { draft: DraftId },
    /// The main outline path of a draft.
    Path { draft: DraftId },
    /// The `index`-th copy of a draft's outline.
    Clone { draft: DraftId, index: usize },
    /// The `index`-th bubble floating on a draft's surface.
    Bubble { draft: DraftId, index: usize },
}

impl Target {
    pub fn element(id: impl Into<String>) -> Self {
        Self::Element { id: id.into() }
    }
}

/// Animatable numeric properties.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    DashOffset,
    Opacity,
    ScaleX,
    ScaleY,
    /// Vertical offset in px; negative moves up.
    TranslateY,
}

/// Resolved stroke of a path.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StrokeStyle {
    pub color: String,
    pub width: f64,
    pub opacity: f64,
    /// `[dash, gap]` in px.
    pub dash_array: [f64; 2],
    pub dash_offset: f64,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum RenderCommand {
    /// Lays a drawing surface covering `frame` (page coordinates) over `element`.
    CreateSurface {
        draft: DraftId,
        element: String,
        frame: Rect,
    },
    /// Adds the outline path (SVG path data, surface-local) to a draft's surface.
    CreatePath {
        draft: DraftId,
        svg: String,
        length: f64,
        style: StrokeStyle,
    },
    /// Copies the draft's path with a new stroke colour, width and opacity.
    ClonePath {
        draft: DraftId,
        index: usize,
        color: String,
        width: f64,
        opacity: f64,
    },
    /// Adds a round bubble centred at `center` (surface-local) on a draft's surface.
    CreateBubble {
        draft: DraftId,
        index: usize,
        center: Point,
        radius: f64,
        tint: String,
        opacity: f64,
    },
    SetFrame {
        target: Target,
        frame: Rect,
    },
    /// Restricts painting of `target` to the SVG path `svg` in its own coordinates;
    /// `None` lifts the clip.
    SetClip {
        target: Target,
        svg: Option<String>,
    },
    SetFill {
        target: Target,
        color: Option<String>,
    },
    SetVisibility {
        target: Target,
        visible: bool,
    },
    SetOpacity {
        target: Target,
        opacity: f64,
    },
    SetPointerEvents {
        target: Target,
        enabled: bool,
    },
    Tween {
        target: Target,
        property: Property,
        tween: Tween,
    },
}

impl RenderCommand {
    /// The element the command acts on, if it addresses one directly.
    pub fn target(&self) -> Option<Target> {
        match self {
            Self::CreateSurface { draft, .. } => Some(Target::Surface { draft: *draft }),
            Self::CreatePath { draft, .. } => Some(Target::Path { draft: *draft }),
            Self::ClonePath { draft, index, .. } => Some(Target::Clone {
                draft: *draft,
                index: *index,
            }),
            Self::CreateBubble { draft, index, .. } => Some(Target::Bubble {
                draft: *draft,
                index: *index,
            }),
            Self::SetFrame { target, .. }
            | Self::SetClip { target, .. }
            | Self::SetFill { target, .. }
            | Self::SetVisibility { target, .. }
            | Self::SetOpacity { target, .. }
            | Self::SetPointerEvents { target, .. }
            | Self::Tween { target, .. } => Some(target.clone()),
        }
    }
}

/// Receiver of render commands in emission order.
///
/// `at` is the event-loop time the command was issued; tweens start at that instant.
pub trait RenderSurface {
    fn apply(&mut self, at: Millis, command: RenderCommand) -> EdgeFxResult<()>;
}

pub type SharedSurface = Rc<RefCell<dyn RenderSurface>>;

/// Emits commands to a shared surface stamped with the loop clock.
#[derive(Clone)]
pub struct Painter {
    surface: SharedSurface,
    event_loop: EventLoop,
}

impl Painter {
    pub fn new(surface: SharedSurface, event_loop: EventLoop) -> Self {
        Self {
            surface,
            event_loop,
        }
    }

    pub fn event_loop(&self) -> &EventLoop {
        &self.event_loop
    }

    pub fn now(&self) -> Millis {
        self.event_loop.now()
    }

    pub fn emit(&self, command: RenderCommand) -> EdgeFxResult<()> {
        let at = self.event_loop.now();
        tracing::trace!(%at, ?command, "render command");
        self.surface.borrow_mut().apply(at, command)
    }

    pub fn show(&self, target: Target, visible: bool) -> EdgeFxResult<()> {
        self.emit(RenderCommand::SetVisibility { target, visible })
    }

    pub fn opacity(&self, target: Target, opacity: f64) -> EdgeFxResult<()> {
        self.emit(RenderCommand::SetOpacity { target, opacity })
    }

    /// Starts a linear tween of `property` on `target`.
    pub fn tween(
        &self,
        target: Target,
        property: Property,
        from: f64,
        to: f64,
        duration: Millis,
    ) -> EdgeFxResult<()> {
        self.animate(target, property, Tween::linear(from, to, duration))
    }

    pub fn animate(&self, target: Target, property: Property, tween: Tween) -> EdgeFxResult<()> {
        self.emit(RenderCommand::Tween {
            target,
            property,
            tween,
        })
    }

    /// Runs `then` once `delay` has passed on the loop clock.
    pub fn after(&self, delay: Millis, then: impl FnOnce() + 'static) -> TimerId {
        self.event_loop.defer(delay, then)
    }
}

impl std::fmt::Debug for Painter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Painter")
            .field("event_loop", &self.event_loop)
            .finish_non_exhaustive()
    }
}
