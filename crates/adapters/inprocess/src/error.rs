//! In-process engine error types.

use autoproc_domain::error::AutoProcError;

/// Errors specific to the in-process engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No message starter subscribes to the topic.
    #[error("no starter subscribes to topic {topic}")]
    NoSubscriber { topic: String },

    /// The starter to activate does not exist.
    #[error("starter {name} is not defined")]
    UnknownStarter { name: String },

    /// A starter or job refers to a master that was never defined.
    #[error("{kind} master {name} is not defined")]
    UnknownMaster { kind: &'static str, name: String },
}

impl EngineError {
    /// Convert into the [`AutoProcError`] variant of the port it surfaced on.
    #[must_use]
    pub fn into_domain(self) -> AutoProcError {
        match self {
            Self::NoSubscriber { .. } => AutoProcError::Messaging(Box::new(self)),
            Self::UnknownStarter { .. } | Self::UnknownMaster { .. } => {
                AutoProcError::ControlPlane(Box::new(self))
            }
        }
    }
}

impl From<EngineError> for AutoProcError {
    fn from(err: EngineError) -> Self {
        err.into_domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_no_subscriber_error() {
        let err = EngineError::NoSubscriber {
            topic: "Prcs.Order".to_string(),
        };
        assert_eq!(err.to_string(), "no starter subscribes to topic Prcs.Order");
    }

    #[test]
    fn should_convert_no_subscriber_to_messaging_error() {
        let err: AutoProcError = EngineError::NoSubscriber {
            topic: "Prcs.Order".to_string(),
        }
        .into();
        assert!(matches!(err, AutoProcError::Messaging(_)));
    }

    #[test]
    fn should_convert_unknown_master_to_control_plane_error() {
        let err: AutoProcError = EngineError::UnknownMaster {
            kind: "starter",
            name: "AutoProcess-MSG".to_string(),
        }
        .into();
        assert!(matches!(err, AutoProcError::ControlPlane(_)));
    }
}
