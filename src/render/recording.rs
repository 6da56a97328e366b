use crate::{
    foundation::{
        core::Millis,
        error::{EdgeFxError, EdgeFxResult},
    },
    render::surface::{Property, RenderCommand, RenderSurface, Target},
};

/// One command as received, with the loop time it was issued at.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Recorded {
    pub at: Millis,
    #[serde(flatten)]
    pub command: RenderCommand,
}

/// In-memory surface for tests, debugging and the CLI timeline output.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RecordingSurface {
    entries: Vec<Recorded>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Recorded] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Commands addressed to `target`, in order.
    pub fn commands_for<'a, 't>(&'a self, target: &'t Target) -> impl Iterator<Item = &'a Recorded> {
        self.entries
            .iter()
            .filter(move |r| r.command.target().as_ref() == Some(target))
    }

    /// Last visibility set on `target` at or before `at`.
    pub fn visible_at(&self, target: &Target, at: Millis) -> Option<bool> {
        self.commands_for(target)
            .filter(|r| r.at <= at)
            .filter_map(|r| match r.command {
                RenderCommand::SetVisibility { visible, .. } => Some(visible),
                _ => None,
            })
            .last()
    }

    /// Value of `property` on `target` at time `at`, from the latest absolute set or
    /// tween issued at or before `at`. Later commands override earlier ones.
    pub fn value_at(&self, target: &Target, property: Property, at: Millis) -> Option<f64> {
        self.commands_for(target)
            .filter(|r| r.at <= at)
            .filter_map(|r| match &r.command {
                RenderCommand::Tween {
                    property: p, tween, ..
                } if *p == property => Some(tween.sample(at.saturating_sub(r.at))),
                RenderCommand::SetOpacity { opacity, .. } if property == Property::Opacity => {
                    Some(*opacity)
                }
                RenderCommand::CreatePath { style, .. } => match property {
                    Property::DashOffset => Some(style.dash_offset),
                    Property::Opacity => Some(style.opacity),
                    _ => None,
                },
                RenderCommand::ClonePath { opacity, .. }
                | RenderCommand::CreateBubble { opacity, .. }
                    if property == Property::Opacity =>
                {
                    Some(*opacity)
                }
                _ => None,
            })
            .last()
    }

    /// Clip in force on `target` at `at`; `None` when unclipped.
    pub fn clip_at(&self, target: &Target, at: Millis) -> Option<&str> {
        self.commands_for(target)
            .filter(|r| r.at <= at)
            .filter_map(|r| match &r.command {
                RenderCommand::SetClip { svg, .. } => Some(svg.as_deref()),
                _ => None,
            })
            .last()
            .flatten()
    }

    /// Time the last command was issued.
    pub fn last_at(&self) -> Option<Millis> {
        self.entries.last().map(|r| r.at)
    }

    pub fn to_json_pretty(&self) -> EdgeFxResult<String> {
        serde_json::to_string_pretty(self).map_err(EdgeFxError::from)
    }
}

impl RenderSurface for RecordingSurface {
    fn apply(&mut self, at: Millis, command: RenderCommand) -> EdgeFxResult<()> {
        if let Some(last) = self.last_at()
            && at < last
        {
            return Err(EdgeFxError::validation(format!(
                "render command at {at} arrived after one at {last}"
            )));
        }
        self.entries.push(Recorded { at, command });
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/recording.rs"]
mod tests;
