//! The `build` command: compile one or more units to WAT (or IR).

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use garnet_diagnostic::{CompileResult, Diagnostic};
use garnet_parse::SourceLoader;

use super::{report, summarize, CliOptions};
use crate::{compile_file, emit, EmitKind};

/// Where one input was written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildOutput {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// One compiled unit and the loader that read it.
struct Built {
    input: PathBuf,
    loader: SourceLoader,
    result: CompileResult<(String, Vec<Diagnostic>)>,
}

/// Compile `files`, each in its own context, in parallel. Outputs are
/// written next to the inputs unless `-o` names the single output.
/// Returns the written files, or `None` after reporting errors.
pub fn build_files(files: &[String], options: &CliOptions) -> Option<Vec<BuildOutput>> {
    if options.output.is_some() && files.len() > 1 {
        eprintln!("error: `-o` can only be used with a single input file");
        return None;
    }

    let built: Vec<Built> = files
        .par_iter()
        .map(|file| build_one(Path::new(file), options))
        .collect();

    let mut outputs = Vec::with_capacity(built.len());
    let (mut errors, mut warnings) = (0, 0);
    for unit in built {
        let main = unit.input.display().to_string();
        match unit.result {
            Ok((text, unit_warnings)) => {
                warnings += unit_warnings.len();
                report(&unit.loader, &main, &unit_warnings, options.color);
                let output =
                    output_path(&unit.input, options.output.as_deref(), options.compile.emit);
                if let Err(e) = std::fs::write(&output, text) {
                    eprintln!("error: cannot write `{}`: {e}", output.display());
                    errors += 1;
                    continue;
                }
                outputs.push(BuildOutput {
                    input: unit.input,
                    output,
                });
            }
            Err(diagnostic) => {
                errors += 1;
                report(&unit.loader, &main, std::slice::from_ref(&diagnostic), options.color);
            }
        }
    }

    if errors > 0 {
        summarize(errors, warnings, options.color);
        return None;
    }
    Some(outputs)
}

fn build_one(input: &Path, options: &CliOptions) -> Built {
    let mut loader = options.compile.loader();
    let result = compile_file(&mut loader, input, &options.compile).map(|mut ctx| {
        let text = emit(&ctx, options.compile.emit);
        (text, ctx.take_warnings())
    });
    Built {
        input: input.to_path_buf(),
        loader,
        result,
    }
}

/// `-o` if given, otherwise the input with the output kind's extension.
pub(super) fn output_path(input: &Path, explicit: Option<&Path>, kind: EmitKind) -> PathBuf {
    explicit.map_or_else(|| input.with_extension(kind.extension()), Path::to_path_buf)
}
