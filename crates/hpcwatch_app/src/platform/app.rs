use std::sync::mpsc;

use anyhow::Context;
use hpcwatch_core::{update, AppState, Effect, Msg};
use hpcwatch_logging::{hpc_error, hpc_info};
use hpcwatch_stream::{Endpoint, Subscription};

use super::commands::{spawn_command_reader, HELP};
use super::effects::{spawn_stream_forwarder, EffectRunner};
use super::logging;
use super::presenter::{NotifySendPresenter, Presenter, TerminalPresenter};
use crate::cli::{Backend, Cli};

pub fn run_app(cli: &Cli) -> anyhow::Result<()> {
    logging::initialize(cli.log, &cli.log_file);

    let endpoint = Endpoint::new(&cli.server, &cli.topic).context("invalid relay endpoint")?;

    match cli.backend {
        Backend::NotifySend => {
            let presenter = NotifySendPresenter::locate(cli.sound.clone())
                .context("notification backend unavailable")?;
            run_with(cli, &endpoint, presenter)
        }
        Backend::Terminal => run_with(cli, &endpoint, TerminalPresenter::stdout()),
    }
}

/// Single consumer loop: the only place `AppState` is written.
fn run_with<P: Presenter>(cli: &Cli, endpoint: &Endpoint, presenter: P) -> anyhow::Result<()> {
    let subscription = Subscription::start(endpoint, cli.stream_settings())
        .context("failed to start relay subscription")?;
    let stop = subscription.stop_handle();
    hpc_info!(
        "HPC Job Monitor started, listening on topic {} at {}",
        endpoint.topic(),
        endpoint.server()
    );

    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();

    let signal_tx = msg_tx.clone();
    ctrlc::set_handler(move || {
        let _ = signal_tx.send(Msg::QuitRequested);
    })
    .context("failed to install signal handler")?;

    let forwarder = spawn_stream_forwarder(subscription, msg_tx.clone())
        .context("failed to spawn stream forwarder")?;
    // Detached: a thread blocked on stdin cannot be joined.
    spawn_command_reader(msg_tx).context("failed to spawn command reader")?;
    hpc_info!("{}", HELP);

    let mut state =
        AppState::with_history_capacity(cli.history_size).with_topic(endpoint.topic());
    let mut runner = EffectRunner::new(presenter);
    let _ = runner.apply(vec![Effect::UpdateTray {
        icon: state.status().icon,
        tooltip: state.tooltip(),
    }]);

    while let Ok(msg) = msg_rx.recv() {
        let (next, effects) = update(state, msg);
        state = next;
        if runner.apply(effects).is_break() {
            break;
        }
    }

    hpc_info!("Shutting down");
    stop.stop();
    drop(msg_rx);
    if forwarder.join().is_err() {
        hpc_error!("Stream forwarder panicked");
    }

    for line in state.view().history_lines() {
        hpc_info!("{}", line);
    }
    Ok(())
}
