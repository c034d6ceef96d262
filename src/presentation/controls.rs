use crate::domain::models::{Action, LoopExit};
use crate::infrastructure::bluetooth::connection::HubLink;
use crate::infrastructure::bluetooth::TrainHub;
use crate::presentation::console;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::error;

/// Map a single keystroke to a controller action
pub fn action_for_key(key: &KeyEvent) -> Action {
    if key.kind != KeyEventKind::Press {
        return Action::Ignore; // Repeat / release
    }

    // Raw mode swallows SIGINT, so Ctrl + C arrives as a key
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
    {
        return Action::Interrupt;
    }

    match key.code {
        // 'A' / 'B' end the up / down arrow escape sequences
        KeyCode::Char('w' | 'W' | 'A') | KeyCode::Up => Action::Accelerate,
        KeyCode::Char('s' | 'S' | 'B') | KeyCode::Down => Action::Decelerate,
        KeyCode::Char(' ') => Action::Stop,
        KeyCode::Char('r' | 'R') => Action::Reverse,
        KeyCode::Char('q' | 'Q') => Action::Quit,
        _ => Action::Ignore,
    }
}

/// Run one action against the hub.
///
/// Returns the reason to leave the control loop, if any. Failed writes are
/// logged and the loop keeps going.
pub async fn apply<L: HubLink>(
    hub: &mut TrainHub<L>,
    action: Action,
    step: i32,
) -> Option<LoopExit> {
    let result = match action {
        Action::Accelerate => hub.increase_speed(step).await,
        Action::Decelerate => hub.decrease_speed(step).await,
        Action::Stop => hub.stop().await,
        Action::Reverse => hub.reverse_direction().await,
        Action::Quit => return Some(LoopExit::Quit),
        Action::Interrupt => return Some(LoopExit::Interrupted),
        Action::Ignore => return None,
    };

    match result {
        Ok(speed) => console::show_speed(speed),
        Err(e) => error!("Error setting speed: {}", e),
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::bluetooth::service::tests::connected_hub;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_key_table() {
        let cases = [
            (KeyCode::Char('w'), Action::Accelerate),
            (KeyCode::Char('W'), Action::Accelerate),
            (KeyCode::Char('A'), Action::Accelerate),
            (KeyCode::Up, Action::Accelerate),
            (KeyCode::Char('s'), Action::Decelerate),
            (KeyCode::Char('S'), Action::Decelerate),
            (KeyCode::Char('B'), Action::Decelerate),
            (KeyCode::Down, Action::Decelerate),
            (KeyCode::Char(' '), Action::Stop),
            (KeyCode::Char('r'), Action::Reverse),
            (KeyCode::Char('R'), Action::Reverse),
            (KeyCode::Char('q'), Action::Quit),
            (KeyCode::Char('Q'), Action::Quit),
            (KeyCode::Char('x'), Action::Ignore),
            (KeyCode::Char('a'), Action::Ignore),
            (KeyCode::Enter, Action::Ignore),
        ];
        for (code, expected) in cases {
            assert_eq!(action_for_key(&press(code)), expected, "{:?}", code);
        }
    }

    #[test]
    fn test_ctrl_c_interrupts() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(action_for_key(&key), Action::Interrupt);
    }

    #[test]
    fn test_release_ignored() {
        let key = KeyEvent::new_with_kind(
            KeyCode::Char('w'),
            KeyModifiers::NONE,
            KeyEventKind::Release,
        );
        assert_eq!(action_for_key(&key), Action::Ignore);
    }

    #[tokio::test]
    async fn test_apply_scenario() {
        let (mut hub, _log) = connected_hub().await;

        for _ in 0..5 {
            assert_eq!(apply(&mut hub, Action::Accelerate, 10).await, None);
        }
        assert_eq!(hub.current_speed(), 50);

        apply(&mut hub, Action::Reverse, 10).await;
        assert_eq!(hub.current_speed(), -50);

        apply(&mut hub, Action::Decelerate, 10).await;
        assert_eq!(hub.current_speed(), -60);

        apply(&mut hub, Action::Stop, 10).await;
        assert_eq!(hub.current_speed(), 0);
    }

    #[tokio::test]
    async fn test_apply_exits() {
        let (mut hub, log) = connected_hub().await;

        assert_eq!(apply(&mut hub, Action::Ignore, 10).await, None);
        assert_eq!(apply(&mut hub, Action::Quit, 10).await, Some(LoopExit::Quit));
        assert_eq!(
            apply(&mut hub, Action::Interrupt, 10).await,
            Some(LoopExit::Interrupted)
        );
        assert!(log.lock().unwrap().writes.is_empty());
    }

    #[tokio::test]
    async fn test_apply_swallows_write_failure() {
        let (mut hub, log) = connected_hub().await;
        apply(&mut hub, Action::Accelerate, 10).await;

        log.lock().unwrap().fail_writes = true;
        assert_eq!(apply(&mut hub, Action::Accelerate, 10).await, None);
        assert_eq!(hub.current_speed(), 10);
    }
}
