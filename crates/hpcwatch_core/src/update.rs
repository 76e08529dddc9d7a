use crate::{classify_at, AppState, Effect, Msg, Notification, TrayIcon};

/// Pure update function: applies a message to state and returns any effects.
///
/// For a received message the effects come out in dispatch order: tray
/// update before the notification. Unknown messages leave the tray alone.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::MessageReceived {
            text,
            title,
            received_at,
        } => {
            let event = classify_at(&text, title.as_deref(), received_at);
            let notification =
                Notification::for_event(event.category, event.job_id.as_deref(), &event.text);
            let recognised = TrayIcon::for_category(event.category).is_some();

            state.record(event);

            let mut effects = Vec::with_capacity(2);
            if recognised {
                effects.push(tray_effect(&state));
            }
            effects.push(Effect::Notify(notification));
            effects
        }
        Msg::ConnectionChanged(link) => {
            let before = state.tooltip();
            state.set_link(link);
            if state.tooltip() != before {
                vec![tray_effect(&state)]
            } else {
                Vec::new()
            }
        }
        Msg::ResetIconRequested => {
            state.reset_icon();
            vec![tray_effect(&state)]
        }
        Msg::ClearHistoryRequested => {
            state.clear_history();
            Vec::new()
        }
        Msg::HistoryRequested => vec![Effect::ShowHistory(state.history().rows())],
        Msg::QuitRequested => vec![Effect::Shutdown],
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn tray_effect(state: &AppState) -> Effect {
    Effect::UpdateTray {
        icon: state.status().icon,
        tooltip: state.tooltip(),
    }
}
