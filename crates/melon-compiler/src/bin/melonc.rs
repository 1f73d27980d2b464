/// Melon compiler CLI

use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use melon_compiler::{compile, validate, CompileOptions, ValidateOptions, Warning};

#[derive(Parser, Debug)]
#[command(name = "melonc")]
#[command(about = "Melon compiler - compile .mln files to optimized .cmp prompts")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a .mln file to .cmp
    Build {
        /// Input .mln source file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output file path (defaults to the input with a .cmp extension)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Optimization level (1-3)
        #[arg(short = 'O', long, default_value_t = 3)]
        optimize: u8,

        /// Include a checksum in the output header
        #[arg(long)]
        checksum: bool,
    },

    /// Validate a .mln file without compiling
    Validate {
        /// Input .mln source file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Skip pointer resolution against ontology files
        #[arg(long)]
        no_check_pointers: bool,
    },

    /// Initialize a new Melon project
    Init {
        /// Target directory (defaults to the current directory)
        #[arg(value_name = "DIRECTORY")]
        directory: Option<PathBuf>,

        /// Project template
        #[arg(short, long, value_enum, default_value_t = Template::Basic)]
        template: Template,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Template {
    Basic,
    Advanced,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let outcome = match args.command {
        Command::Build {
            file,
            output,
            optimize,
            checksum,
        } => build(&file, output, optimize, checksum).await,
        Command::Validate {
            file,
            no_check_pointers,
        } => run_validate(&file, !no_check_pointers).await,
        Command::Init {
            directory,
            template,
        } => init(directory.as_deref(), template).await,
    };

    if let Err(error) = outcome {
        eprintln!("error: {:#}", error);
        process::exit(1);
    }
}

async fn build(
    file: &Path,
    output: Option<PathBuf>,
    optimize: u8,
    checksum: bool,
) -> anyhow::Result<()> {
    let started = Instant::now();
    let (source, base_dir) = read_source(file).await?;

    let options = CompileOptions {
        filename: file.display().to_string(),
        optimization_level: optimize,
        checksum,
    };
    let result = compile(&source, &base_dir, options).await;

    print_warnings(&result.warnings);

    if !result.success {
        for error in &result.errors {
            eprintln!("{}", error.render());
        }
        bail!("compilation failed with {} error(s)", result.errors.len());
    }

    let output_path = output.unwrap_or_else(|| file.with_extension("cmp"));
    let compiled = result.output.unwrap_or_default();
    tokio::fs::write(&output_path, &compiled)
        .await
        .with_context(|| format!("failed to write {}", output_path.display()))?;

    println!("Compiled {} -> {}", file.display(), output_path.display());
    if let Some(stats) = result.stats {
        println!(
            "  {} chars, ~{} tokens, {}ms",
            stats.output_length,
            stats.output_tokens,
            started.elapsed().as_millis()
        );
        println!(
            "  sections: header {} / persona {} / proc {} / tools {} / schemas {}",
            stats.sections.header,
            stats.sections.persona,
            stats.sections.proc,
            stats.sections.tools,
            stats.sections.schemas
        );
    }
    Ok(())
}

async fn run_validate(file: &Path, check_pointers: bool) -> anyhow::Result<()> {
    let (source, base_dir) = read_source(file).await?;

    let options = ValidateOptions {
        filename: file.display().to_string(),
        check_pointers,
    };
    let result = validate(&source, &base_dir, options).await;

    print_warnings(&result.warnings);

    if !result.valid {
        for error in &result.errors {
            eprintln!("{}", error.render());
        }
        bail!("validation failed with {} error(s)", result.errors.len());
    }

    if result.warnings.is_empty() {
        println!("{}: no errors or warnings found", file.display());
    } else {
        println!(
            "{}: valid with {} warning(s)",
            file.display(),
            result.warnings.len()
        );
    }
    Ok(())
}

async fn read_source(file: &Path) -> anyhow::Result<(String, PathBuf)> {
    let source = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let base_dir = file
        .canonicalize()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    Ok((source, base_dir))
}

fn print_warnings(warnings: &[Warning]) {
    for warning in warnings {
        eprintln!(
            "warning: {} ({}:{}:{})",
            warning.message, warning.location.file, warning.location.line, warning.location.column
        );
    }
}

async fn init(directory: Option<&Path>, template: Template) -> anyhow::Result<()> {
    let target = directory.unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(target)
        .await
        .with_context(|| format!("failed to create {}", target.display()))?;

    let (mln, ontology, readme) = match template {
        Template::Basic => (BASIC_MLN, BASIC_ONTOLOGY, BASIC_README),
        Template::Advanced => (ADVANCED_MLN, ADVANCED_ONTOLOGY, ADVANCED_README),
    };

    for (name, content) in [
        ("agent.mln", mln),
        ("ontology.json", ontology),
        ("README.md", readme),
    ] {
        let path = target.join(name);
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    println!("Initialized Melon project in {}", target.display());
    println!("\nCreated files:");
    println!("  - agent.mln");
    println!("  - ontology.json");
    println!("  - README.md");
    println!("\nNext steps:");
    if let Some(dir) = directory {
        println!("  cd {}", dir.display());
    }
    println!("  melonc build agent.mln");
    Ok(())
}

const BASIC_MLN: &str = r#"import ontology from "./ontology.json"

prompt "my_agent:v1.0|mode:strict" {
    schema Output {
        response: string,
        confidence: float,
    }

    persona {
        axiom: ontology.axioms.identity as Pointer,
        traits {
            helpfulness: 0.9,
            professionalism: 0.8,
        }
    }

    proc {
        S0(init) -> S1(process) -> S2(format: Output)
    }
}
"#;

const BASIC_ONTOLOGY: &str = r#"{
  "axioms": {
    "identity": "You are a helpful AI assistant. You provide clear, accurate, and professional responses."
  }
}
"#;

const BASIC_README: &str = r#"# My Melon Agent

A basic Melon prompt programming language project.

## Building

```bash
melonc build agent.mln
```

This will generate `agent.cmp` which can be sent to an LLM.

## Validating

```bash
melonc validate agent.mln
```
"#;

const ADVANCED_MLN: &str = r#"import ontology from "./ontology.json"

prompt "analyst:v1.0|mode:strict" {
    meta {
        checksum: true,
        confidence_token: true,
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

const ADVANCED_ONTOLOGY: &str = r#"{
  "axioms": {
    "analyst": "You are a professional data analyst. You provide objective, data-driven analysis with clear insights."
  },
  "examples": {
    "prof_good": {
      "if": "User provides unclear or incomplete data.",
      "then": "To provide the most accurate analysis, could you please clarify the following aspects of your data: [specific questions]"
    }
  },
  "tools": {
    "analyze": {
      "purpose": "Performs statistical analysis on the provided dataset.",
      "behavior": "Analyzes data using appropriate statistical methods and returns structured insights."
    }
  }
}
"#;

const ADVANCED_README: &str = r#"# Advanced Melon Agent

An advanced Melon project demonstrating tools, examples, and multi-stage
reasoning flows.

## Features

- Typed tool definitions
- Few-shot examples
- Multi-stage reasoning flow
- Checksum validation

## Building

```bash
melonc build agent.mln
```
"#;
