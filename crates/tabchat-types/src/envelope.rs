//! Classified shapes of a completed model reply.

use serde::{Deserialize, Serialize};

/// The two shapes a completed reply can take.
///
/// An envelope never outlives the exchange that produced it; history records
/// the raw reply text, not the classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseEnvelope {
    /// An ordinary prose reply, carried verbatim.
    PlainText { content: String },
    /// A reply carrying program text destined for the execution sink.
    CodeDirective { code: String },
}

impl ResponseEnvelope {
    /// The payload, regardless of variant.
    pub fn payload(&self) -> &str {
        match self {
            ResponseEnvelope::PlainText { content } => content,
            ResponseEnvelope::CodeDirective { code } => code,
        }
    }

    pub fn is_code(&self) -> bool {
        matches!(self, ResponseEnvelope::CodeDirective { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_accessor() {
        let plain = ResponseEnvelope::PlainText {
            content: "The average is 5.2.".into(),
        };
        assert_eq!(plain.payload(), "The average is 5.2.");
        assert!(!plain.is_code());

        let code = ResponseEnvelope::CodeDirective {
            code: "plot(df)".into(),
        };
        assert_eq!(code.payload(), "plot(df)");
        assert!(code.is_code());
    }

    #[test]
    fn test_serialized_tag() {
        let code = ResponseEnvelope::CodeDirective {
            code: "plot(df)".into(),
        };
        let json = serde_json::to_value(&code).unwrap();
        assert_eq!(json["type"], "code_directive");
        assert_eq!(json["code"], "plot(df)");
    }
}
