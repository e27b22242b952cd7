use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use subtone_core::{AppState, EffectRegistry, SchedulerConfig, StateMessage};
use subtone_cli::cli::{Args, effect_listing};
use subtone_cli::{Message, Session};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const RENDER_TIMEOUT: Duration = Duration::from_secs(300);

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("subtone=info")))
        .without_time()
        .init();

    let args = Args::parse();
    if args.list_effects {
        print!("{}", effect_listing());
        return Ok(());
    }

    let mut state = match &args.state {
        Some(path) => AppState::load(path).with_context(|| format!("loading state from {}", path.display()))?,
        None => AppState::default(),
    };
    if let Some(effect) = args.effect {
        state.update(StateMessage::SelectEffect(effect))?;
    }
    for patch in &args.patches {
        if let Err(e) = state.parse_patch(patch).and_then(|edit| state.update(edit)) {
            warn!(patch = %patch, error = %e, "ignoring parameter patch");
        }
    }

    if args.print_state {
        println!("{}", state.to_json()?);
    }
    let Some(input) = &args.input else {
        return Ok(());
    };

    let mut session = Session::new(EffectRegistry::with_builtins(), SchedulerConfig { seed: args.seed })
        .context("starting pipeline worker")?
        .with_state(state);
    session.update(Message::OpenImage(input.clone()));
    if session.source.is_none() {
        bail!("{}", session.status_message);
    }

    let effect = session.state.active_effect;
    let output = session
        .wait_latest(RENDER_TIMEOUT)
        .context("pipeline did not finish")?;
    if let Some(label) = &output.result.label {
        info!(label = %label, "timestamp overlay");
    }

    let path = args.output_path(input, effect);
    subtone_media::save_png(&output.result.frame, &path)
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "done");
    Ok(())
}
