/// Lowest speed the hub accepts (full reverse)
pub const MIN_SPEED: i32 = -100;
/// Highest speed the hub accepts (full forward)
pub const MAX_SPEED: i32 = 100;

/// The only state carried across keystrokes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrainState {
    pub connected: bool,
    /// Last speed the hub acknowledged
    pub current_speed: i32,
}

impl TrainState {
    pub fn accelerated(&self, step: i32) -> i32 {
        self.current_speed.saturating_add(step).clamp(MIN_SPEED, MAX_SPEED)
    }

    pub fn decelerated(&self, step: i32) -> i32 {
        self.current_speed.saturating_sub(step).clamp(MIN_SPEED, MAX_SPEED)
    }

    pub fn reversed(&self) -> i32 {
        -self.current_speed
    }
}

/// What a keystroke asks the controller to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Accelerate,
    Decelerate,
    Stop,
    Reverse,
    Quit,
    Interrupt,
    Ignore,
}

/// Why the control loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Quit,
    Interrupted,
    InputClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accelerate_clamps_to_max() {
        let state = TrainState {
            connected: true,
            current_speed: 95,
        };
        assert_eq!(state.accelerated(10), MAX_SPEED);
    }

    #[test]
    fn test_decelerate_clamps_to_min() {
        let state = TrainState {
            connected: true,
            current_speed: -100,
        };
        assert_eq!(state.decelerated(10), MIN_SPEED);
    }

    #[test]
    fn test_huge_step_saturates() {
        let state = TrainState {
            connected: true,
            current_speed: 10,
        };
        assert_eq!(state.accelerated(i32::MAX), MAX_SPEED);
        assert_eq!(state.decelerated(i32::MAX), MIN_SPEED);
        assert_eq!(state.decelerated(i32::MIN), MAX_SPEED);
    }

    #[test]
    fn test_reverse_twice_restores_speed() {
        for speed in [-100, -30, 0, 40, 100] {
            let once = TrainState {
                connected: true,
                current_speed: speed,
            };
            let twice = TrainState {
                current_speed: once.reversed(),
                ..once
            };
            assert_eq!(twice.reversed(), speed);
        }
    }
}
