use crate::codegen::CodegenError;
use crate::ir::display::Listing;
use crate::span::Span;

/// An error anchored in an IR listing or config file.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn error(message: String, span: Span) -> Self {
        Self {
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    /// Diagnostic for a codegen failure, pointing at the offending
    /// statement in `listing`.
    pub fn from_codegen_error(err: &CodegenError, listing: &Listing) -> Self {
        let d = Diagnostic::error(err.to_string(), listing.span(err.stmt()));
        match err {
            CodegenError::UnsupportedType { .. } => {
                d.with_help("only i32 and f32 values (and vectors of them) can be generated".to_string())
            }
            CodegenError::TypeMismatch { .. } => {
                d.with_note("stores and stage outputs never convert implicitly".to_string())
            }
            CodegenError::ReadOnlyResource { stage, .. } if *stage != "compute" => d
                .with_note("vertex and fragment stages bind buffers read-only".to_string())
                .with_help("move the write into a compute loop".to_string()),
            CodegenError::ReadOnlyResource { .. } => {
                d.with_help("declare the field writable".to_string())
            }
            CodegenError::UndeclaredResource { .. } => d.with_help(
                "enlarge the kernel signature or memory.global_tmps_bytes".to_string(),
            ),
            CodegenError::NoHandler { kind, stage, .. } => {
                d.with_note(format!("a {} stage has no lowering for `{}`", stage, kind))
            }
            CodegenError::MisalignedTemporary { .. } => {
                d.with_help("global temporary offsets are multiples of 4 bytes".to_string())
            }
            CodegenError::FieldOutOfRange { .. } => d
                .with_note("root buffers are indexed with i32 words".to_string())
                .with_help("split the field across several root buffers".to_string()),
            CodegenError::CrossOffloadReference { .. } => d
                .with_note("every top-level parallel loop is dispatched on its own".to_string())
                .with_help(
                    "pass the value through a global temporary, or compute it inside the loop"
                        .to_string(),
                ),
        }
    }

    /// Render the diagnostic to stderr using ariadne.
    pub fn render(&self, filename: &str, source: &str) {
        use ariadne::{Color, Label, Report, ReportKind, Source};

        let mut report = Report::build(ReportKind::Error, filename, self.span.start as usize)
            .with_message(&self.message)
            .with_label(
                Label::new((filename, self.span.range()))
                    .with_message(&self.message)
                    .with_color(Color::Red),
            );

        for note in &self.notes {
            report = report.with_note(note);
        }

        if let Some(help) = &self.help {
            report = report.with_help(help);
        }

        if let Err(e) = report.finish().eprint((filename, Source::from(source))) {
            eprintln!("error: {} (could not render report: {})", self.message, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::IrBuilder;
    use crate::ir::display::listing;
    use crate::ir::stmt::StmtId;

    #[test]
    fn test_error_construction() {
        let span = Span::new(10, 15);
        let d = Diagnostic::error("type mismatch".to_string(), span);
        assert_eq!(d.message, "type mismatch");
        assert_eq!(d.span.start, 10);
        assert_eq!(d.span.end, 15);
        assert!(d.notes.is_empty());
        assert!(d.help.is_none());
    }

    #[test]
    fn test_chained_builders() {
        let d = Diagnostic::error("hint".to_string(), Span::new(0, 5))
            .with_note("note 1".to_string())
            .with_help("help text".to_string())
            .with_note("note 2".to_string());
        assert_eq!(d.notes, vec!["note 1", "note 2"]);
        assert_eq!(d.help.as_deref(), Some("help text"));
    }

    #[test]
    fn test_codegen_error_points_at_statement() {
        let mut b = IrBuilder::new();
        b.create_const_i32(1);
        let d = b.create_discard();
        let module = b.finish();
        let l = listing(&module);
        let err = CodegenError::NoHandler {
            stmt: d,
            kind: "discard",
            stage: "compute",
        };
        let diag = Diagnostic::from_codegen_error(&err, &l);
        assert_eq!(&l.text[diag.span.range()], "%1 = discard");
        assert!(diag.message.contains("compute"));
        assert_eq!(diag.notes.len(), 1);
    }

    #[test]
    fn test_cross_offload_help() {
        let l = listing(&IrBuilder::new().finish());
        let err = CodegenError::CrossOffloadReference {
            stmt: StmtId(4),
            operand: StmtId(1),
        };
        let diag = Diagnostic::from_codegen_error(&err, &l);
        assert_eq!(diag.span, Span::dummy());
        assert!(diag.help.unwrap().contains("global temporary"));
    }

    #[test]
    fn test_render_does_not_panic() {
        let source = "%0 = const i32 1\n%1 = discard\n";
        let d = Diagnostic::error("no handler".to_string(), Span::new(17, 29))
            .with_note("compute stage".to_string());
        d.render("kernel.ir", source);
        Diagnostic::error("unused".to_string(), Span::new(0, 16)).render("kernel.ir", source);
    }
}
