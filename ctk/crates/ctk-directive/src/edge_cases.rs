//! Edge case tests for ctk-directive

#[cfg(test)]
mod tests {
    use crate::{Classification, DirectiveParser, FilterSet, Instructions, Step};

    fn parse_source(source: &str) -> Option<Instructions> {
        let filters = FilterSet::default();
        DirectiveParser::new(&filters).parse_source(source, Some("Fixture"))
    }

    // ==================== EDGE CASES ====================

    /// EDGE CASE: Empty source
    #[test]
    fn test_edge_empty_source() {
        assert!(parse_source("").is_none());
    }

    /// EDGE CASE: Marker only in a line comment
    #[test]
    fn test_edge_marker_in_line_comment() {
        assert!(parse_source("// @test\n// @run main A\nclass A {}").is_none());
    }

    /// EDGE CASE: Unterminated block comment
    #[test]
    fn test_edge_unterminated_block() {
        assert!(parse_source("/* @test\n * @run main A\n").is_none());
    }

    /// EDGE CASE: License header precedes the test block
    #[test]
    fn test_edge_license_header_first() {
        let source = "/*\n * Copyright (c) 2010\n * @compile Bogus.java\n */\n\
                      /*\n * @test\n * @run main Real\n */\nclass Real {}";
        let instructions = parse_source(source).unwrap();
        assert_eq!(instructions.runs()[0].entry_point, "Real");
        assert_eq!(instructions.compile_steps().count(), 0);
    }

    /// EDGE CASE: Directives after the test block are ignored
    #[test]
    fn test_edge_directives_outside_block() {
        let source = "/* @test\n * @run main A\n */\n/* @compile B.java */";
        let instructions = parse_source(source).unwrap();
        assert_eq!(instructions.compile_steps().count(), 0);
    }

    /// EDGE CASE: Marker glued to another token
    #[test]
    fn test_edge_marker_requires_whitespace() {
        assert!(parse_source("/*@test\n * @run main A */").is_none());
        assert!(parse_source("/* @tests\n * @run main A */").is_none());
    }

    /// EDGE CASE: Single-line block
    #[test]
    fn test_edge_single_line_block() {
        let instructions = parse_source("/* @test @run main A */").map(|i| i.runs().len());
        // Directives must start a line; the marker alone does not make it positive.
        assert_eq!(instructions, None);
    }

    /// EDGE CASE: Javadoc-style opener
    #[test]
    fn test_edge_javadoc_opener() {
        let instructions = parse_source("/**\n * @test\n * @run main A\n **/").unwrap();
        assert_eq!(instructions.runs()[0].entry_point, "A");
    }

    /// EDGE CASE: Lines without the star continuation prefix
    #[test]
    fn test_edge_no_star_prefix() {
        let instructions = parse_source("/*\n @test\n @compile A.java\n*/").unwrap();
        assert_eq!(instructions.classification(), Classification::Compile);
    }

    /// EDGE CASE: Keyword prefix of an unknown directive
    #[test]
    fn test_edge_keyword_prefix_not_matched() {
        assert!(parse_source("/* @test\n * @compilex A.java\n * @runner main A\n */").is_none());
    }

    /// EDGE CASE: Bare compile directive still counts as positive
    #[test]
    fn test_edge_bare_compile() {
        let instructions = parse_source("/* @test\n * @compile\n */").unwrap();
        let steps: Vec<_> = instructions.compile_steps().collect();
        assert_eq!(steps.len(), 1);
        assert!(steps[0].files.is_empty());
    }

    /// EDGE CASE: Bare run main defaults to the primary type
    #[test]
    fn test_edge_bare_run_main() {
        let instructions = parse_source("/* @test\n * @run main\n */").unwrap();
        assert_eq!(instructions.runs()[0].entry_point, "Fixture");
        assert!(instructions.runs()[0].args.is_empty());
    }

    /// EDGE CASE: Bare run main without a primary type is dropped
    #[test]
    fn test_edge_bare_run_main_no_primary() {
        let filters = FilterSet::default();
        let parser = DirectiveParser::new(&filters);
        assert!(parser.parse_source("/* @test\n * @run main\n */", None).is_none());
    }

    /// EDGE CASE: Unsupported run mode is ignored
    #[test]
    fn test_edge_unsupported_run_mode() {
        assert!(parse_source("/* @test\n * @run shell script.sh\n */").is_none());
    }

    /// EDGE CASE: run compile behaves like compile
    #[test]
    fn test_edge_run_compile() {
        let instructions = parse_source("/* @test\n * @run compile -XDfoo A.java\n */").unwrap();
        let steps: Vec<_> = instructions.compile_steps().collect();
        assert_eq!(steps[0].files, vec!["A.java"]);
    }

    /// EDGE CASE: run compile/fail is a negative fixture
    #[test]
    fn test_edge_run_compile_fail() {
        assert!(parse_source("/* @test\n * @run compile/fail A.java\n */").is_none());
    }

    /// EDGE CASE: Negative compile after a positive run
    #[test]
    fn test_edge_negative_wins_over_run() {
        assert!(parse_source("/* @test\n * @run main A\n * @compile/fail B.java\n */").is_none());
    }

    /// EDGE CASE: Value option at the end of the line
    #[test]
    fn test_edge_value_option_without_value() {
        let instructions = parse_source("/* @test\n * @compile A.java -d\n */").unwrap();
        let steps: Vec<_> = instructions.compile_steps().collect();
        assert_eq!(steps[0].files, vec!["A.java"]);
    }

    /// EDGE CASE: Clean alone is not positive
    #[test]
    fn test_edge_clean_only() {
        assert!(parse_source("/* @test\n * @clean p.A\n */").is_none());
    }

    /// EDGE CASE: Run modifiers stack
    #[test]
    fn test_edge_stacked_run_modifiers() {
        let instructions =
            parse_source("/* @test\n * @run main/othervm/timeout=60/fail Crash boom\n */").unwrap();
        let run = &instructions.runs()[0];
        assert!(run.expect_failure);
        assert_eq!(run.entry_point, "Crash");
        assert_eq!(run.args, vec!["boom"]);
    }

    /// EDGE CASE: Clean between two runs keeps its position
    #[test]
    fn test_edge_clean_position() {
        let instructions = parse_source(
            "/* @test\n * @compile A.java\n * @run clean A\n * @compile A.java\n */",
        )
        .unwrap();
        let kinds: Vec<bool> = instructions
            .steps()
            .iter()
            .map(|step| matches!(step, Step::Clean(_)))
            .collect();
        assert_eq!(kinds, vec![false, true, false]);
    }

    /// EDGE CASE: Trailing comment closer on a directive line
    #[test]
    fn test_edge_closer_on_directive_line() {
        let instructions = parse_source("/* @test\n * @run main A x */").unwrap();
        assert_eq!(instructions.runs()[0].args, vec!["x"]);
    }

    /// EDGE CASE: Non-UTF-8 bytes in a fixture file
    #[test]
    fn test_edge_lossy_decoding() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("Latin.java");
        let mut bytes = b"/* @test\n * @run main Latin\n * caf".to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b"\n */\n");
        std::fs::write(&path, bytes).unwrap();

        let filters = FilterSet::default();
        assert!(DirectiveParser::new(&filters).parse_file(&path).is_some());
    }
}
