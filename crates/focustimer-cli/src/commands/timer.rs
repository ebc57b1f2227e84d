use std::sync::Arc;

use clap::Subcommand;
use focustimer_core::storage::snapshot;
use focustimer_core::timer::duration_minutes;
use focustimer_core::{
    effects, AppLifecycle, Clock, Collaborators, Config, Database, DurationLimits, Event,
    RuntimeOptions, SessionKind, SettingsPatch, SystemClock, TimerController, TimerHandle,
    TimerRuntime, TimerState,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::devices::{TerminalBell, TerminalNotifier};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run the timer, reading commands from stdin and printing events as JSON lines
    Run {
        /// Also print a state snapshot every second
        #[arg(long)]
        ticks: bool,
    },
    /// Print the persisted timer state as JSON
    Status,
    /// Set a session length in minutes (clamped to the configured limits)
    SetDuration {
        /// focus, break or long-break
        kind: String,
        minutes: u32,
    },
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TimerAction::Run { ticks } => {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            rt.block_on(interactive(ticks))?;
        }
        TimerAction::Status => {
            let db = Database::open()?;
            let config = Config::load_or_default();
            let state = snapshot::load_timer_state_over(config.initial_state(), &db);
            let event = Event::snapshot(&state, chrono::Utc::now());
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        TimerAction::SetDuration { kind, minutes } => {
            let kind = parse_kind(&kind)?;
            let db = Arc::new(Database::open()?);
            let config = Config::load_or_default();
            let minutes = config.limits.clamp(kind, minutes);
            let mut controller = TimerController::restore_over(
                config.initial_state(),
                db.as_ref(),
                AppLifecycle::Active,
            );
            let outcome = controller.set_duration(kind, minutes, SystemClock.now_ms());

            let collaborators = Collaborators {
                stats: db.clone(),
                notifier: Arc::new(TerminalNotifier::new()),
                sound: Arc::new(TerminalBell),
                store: db,
            };
            for effect in &outcome.effects {
                effects::execute(&collaborators, effect);
            }
            println!("{kind} duration set to {minutes} min");
        }
    }
    Ok(())
}

fn parse_kind(s: &str) -> Result<SessionKind, String> {
    SessionKind::parse(s).ok_or_else(|| format!("unknown session kind: {s}"))
}

fn parse_switch(s: &str) -> Result<bool, String> {
    match s {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        other => Err(format!("expected on/off, got '{other}'")),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum DurationChange {
    Set(u32),
    Step { increase: bool },
}

/// One line of interactive input.
#[derive(Debug, Clone, PartialEq)]
enum Input {
    Start,
    Pause,
    Resume,
    Stop,
    Reset,
    Switch(SessionKind),
    Duration(SessionKind, DurationChange),
    Settings(SettingsPatch),
    Lifecycle(AppLifecycle),
    Status,
    Help,
    Quit,
}

fn parse_input(line: &str) -> Result<Option<Input>, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&command, args)) = words.split_first() else {
        return Ok(None);
    };
    let arg = |i: usize| -> Result<&str, String> {
        args.get(i)
            .copied()
            .ok_or_else(|| format!("'{command}' needs more arguments"))
    };

    let input = match command {
        "start" => Input::Start,
        "pause" => Input::Pause,
        "resume" => Input::Resume,
        "stop" => Input::Stop,
        "reset" => Input::Reset,
        "switch" => Input::Switch(parse_kind(arg(0)?)?),
        "duration" => {
            let kind = parse_kind(arg(0)?)?;
            let change = match arg(1)? {
                "+" => DurationChange::Step { increase: true },
                "-" => DurationChange::Step { increase: false },
                n => DurationChange::Set(
                    n.parse()
                        .map_err(|_| format!("invalid minutes: {n}"))?,
                ),
            };
            Input::Duration(kind, change)
        }
        "sound" => Input::Settings(SettingsPatch {
            sound_enabled: Some(parse_switch(arg(0)?)?),
            ..SettingsPatch::default()
        }),
        "notifications" => Input::Settings(SettingsPatch {
            notifications_enabled: Some(parse_switch(arg(0)?)?),
            ..SettingsPatch::default()
        }),
        "vibration" => Input::Settings(SettingsPatch {
            vibration_enabled: Some(parse_switch(arg(0)?)?),
            ..SettingsPatch::default()
        }),
        "bg" | "fg" | "inactive" | "background" | "foreground" | "active" => {
            Input::Lifecycle(
                AppLifecycle::parse(command).ok_or_else(|| format!("unknown state: {command}"))?,
            )
        }
        "status" => Input::Status,
        "help" | "?" => Input::Help,
        "quit" | "exit" | "q" => Input::Quit,
        other => return Err(format!("unknown command: {other} (try 'help')")),
    };
    Ok(Some(input))
}

const HELP: &str = "\
commands:
  start | pause | resume | stop | reset
  switch <focus|break|long-break>
  duration <kind> <minutes|+|->
  sound|notifications|vibration <on|off>
  bg | fg | inactive
  status | quit";

fn resolve_minutes(
    state: &TimerState,
    limits: &DurationLimits,
    kind: SessionKind,
    change: &DurationChange,
) -> u32 {
    match change {
        DurationChange::Set(minutes) => limits.clamp(kind, *minutes),
        DurationChange::Step { increase } => {
            limits.step(kind, duration_minutes(state, kind), *increase)
        }
    }
}

fn print_event(event: &Event) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => debug!("failed to encode event: {e}"),
    }
}

async fn interactive(ticks: bool) -> Result<(), Box<dyn std::error::Error>> {
    let db = Arc::new(Database::open()?);
    let config = Config::load_or_default();
    let controller =
        TimerController::restore_over(config.initial_state(), db.as_ref(), AppLifecycle::Active);
    let collaborators = Collaborators {
        stats: db.clone(),
        notifier: Arc::new(TerminalNotifier::new()),
        sound: Arc::new(TerminalBell),
        store: db,
    };

    let (timer, task) = TimerRuntime::spawn(
        controller,
        collaborators,
        Arc::new(SystemClock),
        RuntimeOptions::default(),
    );

    let mut events = timer.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if ticks || !matches!(event, Event::StateSnapshot { .. }) {
                        print_event(&event);
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "event printer lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    info!("timer ready; type 'help' for commands");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_input(&line) {
            Ok(None) => {}
            Ok(Some(Input::Quit)) => break,
            Ok(Some(input)) => handle(&timer, &config.limits, input).await?,
            Err(message) => eprintln!("{message}"),
        }
    }

    timer.shutdown().await?;
    task.await?;
    // The printer stops once the last event sender is gone.
    drop(timer);
    printer.await?;
    Ok(())
}

async fn handle(
    timer: &TimerHandle,
    limits: &DurationLimits,
    input: Input,
) -> focustimer_core::Result<()> {
    match input {
        Input::Start => timer.start().await,
        Input::Pause => timer.pause().await,
        Input::Resume => timer.resume().await,
        Input::Stop => timer.stop().await,
        Input::Reset => timer.reset().await,
        Input::Switch(kind) => timer.switch_session(kind).await,
        Input::Duration(kind, change) => {
            let state = timer.snapshot().await?;
            let minutes = resolve_minutes(&state, limits, kind, &change);
            timer.set_duration(kind, minutes).await
        }
        Input::Settings(patch) => timer.update_settings(patch).await,
        Input::Lifecycle(next) => timer.app_state_changed(next).await,
        Input::Status => {
            let state = timer.snapshot().await?;
            print_event(&Event::snapshot(&state, chrono::Utc::now()));
            Ok(())
        }
        Input::Help => {
            eprintln!("{HELP}");
            Ok(())
        }
        Input::Quit => Ok(()),
    }
}
