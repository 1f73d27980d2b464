/// Integration tests for the full compile pipeline

use std::path::Path;

use melon_compiler::{compile, validate, CompileOptions, ValidateOptions};

const ONTOLOGY: &str = r#"{
  "axioms": {
    "analyst": "You are a professional data analyst."
  },
  "examples": {
    "prof_good": {
      "if": "User provides unclear data.",
      "then": "Could you clarify your data?"
    }
  },
  "tools": {
    "analyze": {
      "purpose": "Performs statistical analysis.",
      "behavior": "Returns structured insights."
    }
  }
}"#;

const SOURCE: &str = r#"
import ontology from "./ontology.json"

prompt "analyst:v1.0|mode:strict" {
    meta {
        checksum: true,
    }

    schema Analysis {
        summary: string,
        key_findings: array(string),
        confidence: float,
    }

    persona {
        axiom: ontology.axioms.analyst as Pointer,
        traits {
            professionalism: 1.0,
            analytical: 0.95,
            verbosity: 0.4,
        }
        example(positive, on: professionalism) {
            if: ontology.examples.prof_good.if as Pointer,
            then: ontology.examples.prof_good.then as Pointer,
        }
    }

    proc {
        S0(init) -> S1(gather_data) -> S2(exec: tools.analyze_data)
        -> S3(synthesize) -> S4(format: Analysis)
    }

    tools {
        tool analyze_data(data: json, depth: int) -> json {
            purpose: ontology.tools.analyze.purpose as Pointer,
            behavior: ontology.tools.analyze.behavior as Pointer,
        }
    }
}
"#;

fn project_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ontology.json"), ONTOLOGY).unwrap();
    dir
}

async fn compile_in(dir: &Path, source: &str) -> melon_compiler::CompileResult {
    compile(source, dir, CompileOptions::default()).await
}

#[tokio::test]
async fn full_program_compiles_to_all_sections() {
    let dir = project_dir();
    let result = compile_in(dir.path(), SOURCE).await;
    assert!(result.success, "errors: {:?}", result.errors);

    let output = result.output.unwrap();
    let sections: Vec<&str> = output.split('§').collect();
    assert_eq!(sections.len(), 5);

    // Header carries version, mode, and the meta-requested checksum.
    assert!(sections[0].starts_with("HDR|v:1.0^m:st^c:"));

    // Persona: resolved axiom, compressed traits, signed example.
    assert!(sections[1].contains("AX:You are a professional data analyst."));
    assert!(sections[1].contains("T:pr=10,an=10,ve=4"));
    assert!(sections[1].contains("EX:+pr(User provides unclear data.|Could you clarify your data?)"));

    // Proc chain with all three body forms.
    assert_eq!(
        sections[2],
        "PRC|S0(init)>S1(gather_data)>S2(exec:analyze_data)>S3(synthesize)>S4(format:Analysis)"
    );

    // Tools with compressed signature and resolved properties.
    assert!(sections[3].starts_with("TLS|analyze_data(data:j,depth:i)>j{"));
    assert!(sections[3].contains("purpose:Performs statistical analysis."));

    assert_eq!(
        sections[4],
        "SCH|Analysis{summary:s^key_findings:a(s)^confidence:f}"
    );
}

#[tokio::test]
async fn three_stage_agent_compiles() {
    let dir = tempfile::tempdir().unwrap();
    let source = r#"
prompt "agent:v1.0|mode:strict" {
    schema Output {
        response: string,
        confidence: float,
    }
    persona {
        traits {
            helpfulness: 0.9,
        }
    }
    proc {
        S0(init) -> S1(process) -> S2(format: Output)
    }
}
"#;
    let result = compile_in(dir.path(), source).await;
    assert!(result.success, "errors: {:?}", result.errors);

    let output = result.output.unwrap();
    assert!(output.contains("SCH|Output{response:s^confidence:f}"));
    assert!(output.contains("PRC|S0(init)>S1(process)>S2(format:Output)"));
    assert!(output.contains("T:he=9"));
}

#[tokio::test]
async fn compilation_is_deterministic() {
    let dir = project_dir();
    let first = compile_in(dir.path(), SOURCE).await.output.unwrap();
    let second = compile_in(dir.path(), SOURCE).await.output.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn stats_track_each_section() {
    let dir = project_dir();
    let result = compile_in(dir.path(), SOURCE).await;
    let output = result.output.unwrap();
    let stats = result.stats.unwrap();

    assert_eq!(stats.output_length, output.chars().count());
    assert_eq!(stats.output_tokens, stats.output_length.div_ceil(4));

    // Four section delimiters between the five sections.
    let section_sum = stats.sections.header
        + stats.sections.persona
        + stats.sections.proc
        + stats.sections.tools
        + stats.sections.schemas;
    assert_eq!(stats.output_length, section_sum + 4);
}

#[tokio::test]
async fn validate_accepts_what_compile_accepts() {
    let dir = project_dir();
    let result = validate(SOURCE, dir.path(), ValidateOptions::default()).await;
    assert!(result.valid, "errors: {:?}", result.errors);
}

#[tokio::test]
async fn broken_pointer_fails_compile_but_not_unchecked_validate() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ontology.json"), r#"{"axioms": {}}"#).unwrap();

    let result = compile_in(dir.path(), SOURCE).await;
    assert!(!result.success);
    assert_eq!(result.errors[0].code(), "E300");

    let options = ValidateOptions {
        check_pointers: false,
        ..ValidateOptions::default()
    };
    let result = validate(SOURCE, dir.path(), options).await;
    assert!(result.valid);
}

#[tokio::test]
async fn type_errors_accumulate_across_blocks() {
    let dir = project_dir();
    let source = r#"
prompt "a:1|mode:strict" {
    schema Out { r: string, r: string, }
    persona {
        traits {
            verbosity: 1.5,
        }
    }
    proc { S0(exec: tools.missing) -> S1(format: Out) }
}
"#;
    let result = compile_in(dir.path(), source).await;
    assert!(!result.success);

    let messages: Vec<&str> = result.errors.iter().map(|e| e.message.as_str()).collect();
    assert!(messages.iter().any(|m| m.contains("Duplicate field name 'r'")));
    assert!(messages.iter().any(|m| m.contains("Invalid trait value for 'verbosity'")));
    assert!(messages.iter().any(|m| m.contains("Unknown tool reference: missing")));
}
