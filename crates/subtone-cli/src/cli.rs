use std::path::{Path, PathBuf};

use clap::Parser;
use subtone_core::{EffectId, ParameterDefinition, ParameterType, PreprocessingParameters};

/// Apply a stylization effect to an image.
#[derive(Debug, Parser)]
#[command(name = "subtone", version)]
pub struct Args {
    /// Input image (PNG, JPEG or WebP).
    #[arg(required_unless_present_any = ["list_effects", "print_state"])]
    pub input: Option<PathBuf>,

    /// Output PNG. Defaults to `<input>-<effect>.png` next to the input.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Effect to apply, overriding the one in `--state`.
    #[arg(short, long)]
    pub effect: Option<EffectId>,

    /// JSON parameter record to start from.
    #[arg(long, value_name = "FILE")]
    pub state: Option<PathBuf>,

    /// Set a preprocessing or active-effect parameter. Repeatable.
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub patches: Vec<String>,

    /// Seed for grain, random dithering and signal noise.
    #[arg(long)]
    pub seed: Option<u64>,

    /// List effects and their parameters, then exit.
    #[arg(long)]
    pub list_effects: bool,

    /// Print the effective parameter record as JSON.
    #[arg(long)]
    pub print_state: bool,
}

impl Args {
    pub fn output_path(&self, input: &Path, effect: EffectId) -> PathBuf {
        if let Some(output) = &self.output {
            return output.clone();
        }
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".into());
        input.with_file_name(format!("{stem}-{}.png", effect.id()))
    }
}

/// One line per parameter: name, kind, range and default.
pub fn describe_parameter(def: &ParameterDefinition) -> String {
    let detail = match &def.param_type {
        ParameterType::Float { default, min, max, step } => {
            format!("float {min}..={max} step {step}, default {default}")
        }
        ParameterType::Int { default, min, max } => format!("int {min}..={max}, default {default}"),
        ParameterType::Bool { default } => format!("bool, default {default}"),
        ParameterType::Choice { default, options } => {
            format!("one of {}, default {default}", options.join("|"))
        }
        ParameterType::Text { default, max_len } => {
            format!("text up to {max_len} chars, default {default:?}")
        }
    };
    format!("{:<18} {detail}", def.name)
}

/// Listing printed by `--list-effects`.
pub fn effect_listing() -> String {
    let mut out = String::from("preprocessing\n");
    for def in PreprocessingParameters::parameter_definitions() {
        out.push_str(&format!("    {}\n", describe_parameter(&def)));
    }
    for effect in EffectId::all() {
        out.push_str(&format!("{:<12} {}\n", effect.id(), effect.display_name()));
        for def in effect.parameter_definitions() {
            out.push_str(&format!("    {}\n", describe_parameter(&def)));
        }
    }
    out
}
