//! Pre-dispatch input validation.
//!
//! [`validate`] is pure: same descriptor and input, same answer. It runs
//! before every dispatch attempt and a failure blocks the dispatch.

use crate::error::ValidationError;
use crate::input::{PendingInput, UploadFile};
use crate::registry::{InputMode, ToolDescriptor};

/// Check `input` against the preconditions of `tool`.
///
/// * single-file tools need exactly one accepted file within the size limit;
/// * multi-file tools need at least `min_files` files, each accepted and
///   within the size limit;
/// * text tools count characters of the trimmed text against `min_chars`
///   and, if set, `max_chars`.
pub fn validate(tool: &ToolDescriptor, input: &PendingInput) -> Result<(), ValidationError> {
    match tool.input {
        InputMode::SingleFile => match input {
            PendingInput::File(file) => check_file(tool, file),
            PendingInput::Files(files) if files.len() == 1 => check_file(tool, &files[0]),
            PendingInput::Empty => Err(ValidationError::NoFile),
            PendingInput::Files(files) if files.is_empty() => Err(ValidationError::NoFile),
            _ => Err(wrong_kind(tool)),
        },
        InputMode::MultiFile { min_files } => {
            let files: Vec<&UploadFile> = match input {
                PendingInput::Files(files) => files.iter().collect(),
                PendingInput::File(file) => vec![file],
                PendingInput::Empty => vec![],
                PendingInput::Text(_) => return Err(wrong_kind(tool)),
            };
            if files.len() < min_files {
                return Err(ValidationError::TooFewFiles {
                    required: min_files,
                    got: files.len(),
                });
            }
            files.into_iter().try_for_each(|f| check_file(tool, f))
        }
        InputMode::Text {
            min_chars,
            max_chars,
        } => {
            let text = match input {
                PendingInput::Text(t) => t.as_str(),
                PendingInput::Empty => "",
                _ => return Err(wrong_kind(tool)),
            };
            let len = text.trim().chars().count();
            if len < min_chars {
                return Err(ValidationError::TextTooShort {
                    min: min_chars,
                    needed: min_chars - len,
                });
            }
            if let Some(max) = max_chars {
                if len > max {
                    return Err(ValidationError::TextTooLong { max, len });
                }
            }
            Ok(())
        }
    }
}

fn check_file(tool: &ToolDescriptor, file: &UploadFile) -> Result<(), ValidationError> {
    if !tool.accepts(&file.name, file.content_type.as_deref()) {
        return Err(ValidationError::UnsupportedType {
            name: file.name.clone(),
            accepted: tool.accept_list(),
        });
    }
    if let Some(limit) = tool.max_size_bytes {
        if file.size() > limit {
            return Err(ValidationError::FileTooLarge {
                name: file.name.clone(),
                size: file.size(),
                limit,
            });
        }
    }
    Ok(())
}

fn wrong_kind(tool: &ToolDescriptor) -> ValidationError {
    ValidationError::WrongInputKind {
        tool: tool.id,
        expected: tool.input.describe(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ServiceRegistry, ToolId};

    fn registry() -> ServiceRegistry {
        ServiceRegistry::default()
    }

    fn pdf(name: &str) -> UploadFile {
        UploadFile::from_bytes(name, b"%PDF-1.7".to_vec())
    }

    #[test]
    fn plagiarism_49_chars_needs_one_more() {
        let reg = registry();
        let tool = reg.get(ToolId::Plagiarism);
        let text = "a".repeat(49);
        let err = validate(tool, &PendingInput::Text(text)).unwrap_err();
        assert_eq!(err, ValidationError::TextTooShort { min: 50, needed: 1 });
        assert!(err.to_string().contains("1 more character needed"));
    }

    #[test]
    fn plagiarism_50_chars_passes() {
        let reg = registry();
        let tool = reg.get(ToolId::Plagiarism);
        assert!(validate(tool, &PendingInput::Text("b".repeat(50))).is_ok());
    }

    #[test]
    fn text_length_is_measured_after_trim() {
        let reg = registry();
        let tool = reg.get(ToolId::TextSummary);
        let padded = format!("   {}\n\n", "c".repeat(49));
        assert!(matches!(
            validate(tool, &PendingInput::Text(padded)),
            Err(ValidationError::TextTooShort { needed: 1, .. })
        ));
    }

    #[test]
    fn text_length_counts_characters_not_bytes() {
        let reg = registry();
        let tool = reg.get(ToolId::Plagiarism);
        // 50 two-byte characters.
        assert!(validate(tool, &PendingInput::Text("é".repeat(50))).is_ok());
    }

    #[test]
    fn every_text_tool_rejects_below_minimum() {
        let reg = registry();
        for tool in reg.iter() {
            if let InputMode::Text { min_chars, .. } = tool.input {
                let short = "x".repeat(min_chars - 1);
                assert!(
                    validate(tool, &PendingInput::Text(short)).is_err(),
                    "{} accepted short text",
                    tool.id
                );
            }
        }
    }

    #[test]
    fn text_to_voice_has_upper_bound() {
        let reg = registry();
        let tool = reg.get(ToolId::TextToVoice);
        let err = validate(tool, &PendingInput::Text("y".repeat(5001))).unwrap_err();
        assert_eq!(err, ValidationError::TextTooLong { max: 5000, len: 5001 });
        assert!(validate(tool, &PendingInput::Text("y".repeat(5000))).is_ok());
    }

    #[test]
    fn merge_needs_two_files() {
        let reg = registry();
        let tool = reg.get(ToolId::PdfMerge);
        assert_eq!(
            validate(tool, &PendingInput::Files(vec![pdf("a.pdf")])),
            Err(ValidationError::TooFewFiles {
                required: 2,
                got: 1
            })
        );
        assert_eq!(
            validate(tool, &PendingInput::Empty),
            Err(ValidationError::TooFewFiles {
                required: 2,
                got: 0
            })
        );
        assert!(validate(tool, &PendingInput::Files(vec![pdf("a.pdf"), pdf("b.pdf")])).is_ok());
    }

    #[test]
    fn merge_rejects_non_pdf_member() {
        let reg = registry();
        let tool = reg.get(ToolId::PdfMerge);
        let files = vec![pdf("a.pdf"), UploadFile::from_bytes("b.png", vec![0; 4])];
        assert!(matches!(
            validate(tool, &PendingInput::Files(files)),
            Err(ValidationError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn file_tool_requires_file() {
        let reg = registry();
        let tool = reg.get(ToolId::PdfToWord);
        assert_eq!(
            validate(tool, &PendingInput::Empty),
            Err(ValidationError::NoFile)
        );
        assert!(matches!(
            validate(tool, &PendingInput::Text("hello".into())),
            Err(ValidationError::WrongInputKind { .. })
        ));
        assert!(validate(tool, &PendingInput::File(pdf("in.pdf"))).is_ok());
    }

    #[test]
    fn oversized_file_is_rejected() {
        let reg = ServiceRegistry::default();
        let mut tool = reg.get(ToolId::PdfToWord).clone();
        tool.max_size_bytes = Some(4);
        let err = validate(&tool, &PendingInput::File(pdf("big.pdf"))).unwrap_err();
        assert_eq!(
            err,
            ValidationError::FileTooLarge {
                name: "big.pdf".into(),
                size: 8,
                limit: 4
            }
        );
    }

    #[test]
    fn validation_is_idempotent() {
        let reg = registry();
        let tool = reg.get(ToolId::Plagiarism);
        let input = PendingInput::Text("z".repeat(30));
        let first = validate(tool, &input);
        let second = validate(tool, &input);
        assert_eq!(first, second);
    }
}
