use std::collections::HashSet;

pub type KeyCode = i32;
pub type MouseButton = i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputCode {
    Key(KeyCode),
    Mouse(MouseButton),
}

/// An immutable view of one frame's input, handed to scripts via
/// `consumeSnapshot()` (§4.G). Identical regardless of how many times, or
/// in what order, scripts read it during the frame.
#[derive(Debug, Clone, Default)]
pub struct InputSnapshot {
    pub keys_down: HashSet<KeyCode>,
    pub mouse_down: HashSet<MouseButton>,
    pub just_pressed: HashSet<InputCode>,
    pub just_released: HashSet<InputCode>,
    pub dx: f32,
    pub dy: f32,
    pub wheel: f32,
    pub mx: f32,
    pub my: f32,
}

/// Accumulates raw input events into per-frame sets and deltas (§4.G).
/// `end_frame` must be called exactly once per frame, after scripts have
/// consumed the snapshot, to clear deltas and retire edge sets.
#[derive(Default)]
pub struct InputAggregator {
    keys_down: HashSet<KeyCode>,
    mouse_down: HashSet<MouseButton>,
    just_pressed: HashSet<InputCode>,
    just_released: HashSet<InputCode>,
    dx: f32,
    dy: f32,
    wheel: f32,
    mx: f32,
    my: f32,
}

impl InputAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, code: KeyCode) {
        if self.keys_down.insert(code) {
            self.just_pressed.insert(InputCode::Key(code));
        }
    }

    pub fn key_up(&mut self, code: KeyCode) {
        if self.keys_down.remove(&code) {
            self.just_released.insert(InputCode::Key(code));
        }
    }

    pub fn mouse_down(&mut self, button: MouseButton) {
        if self.mouse_down.insert(button) {
            self.just_pressed.insert(InputCode::Mouse(button));
        }
    }

    pub fn mouse_up(&mut self, button: MouseButton) {
        if self.mouse_down.remove(&button) {
            self.just_released.insert(InputCode::Mouse(button));
        }
    }

    pub fn mouse_delta(&mut self, dx: f32, dy: f32) {
        self.dx += dx;
        self.dy += dy;
    }

    pub fn mouse_wheel(&mut self, delta: f32) {
        self.wheel += delta;
    }

    pub fn mouse_moved_to(&mut self, mx: f32, my: f32) {
        self.mx = mx;
        self.my = my;
    }

    pub fn consume_snapshot(&self) -> InputSnapshot {
        InputSnapshot {
            keys_down: self.keys_down.clone(),
            mouse_down: self.mouse_down.clone(),
            just_pressed: self.just_pressed.clone(),
            just_released: self.just_released.clone(),
            dx: self.dx,
            dy: self.dy,
            wheel: self.wheel,
            mx: self.mx,
            my: self.my,
        }
    }

    pub fn end_frame(&mut self) {
        self.dx = 0.0;
        self.dy = 0.0;
        self.wheel = 0.0;
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

/// Fixed key-name to code table (§4.G). Unknown names resolve to `-1`.
pub fn key_code_for_name(name: &str) -> KeyCode {
    match name {
        "A" => 0,
        "B" => 1,
        "C" => 2,
        "D" => 3,
        "E" => 4,
        "F" => 5,
        "G" => 6,
        "H" => 7,
        "I" => 8,
        "J" => 9,
        "K" => 10,
        "L" => 11,
        "M" => 12,
        "N" => 13,
        "O" => 14,
        "P" => 15,
        "Q" => 16,
        "R" => 17,
        "S" => 18,
        "T" => 19,
        "U" => 20,
        "V" => 21,
        "W" => 22,
        "X" => 23,
        "Y" => 24,
        "Z" => 25,
        "0" => 26,
        "1" => 27,
        "2" => 28,
        "3" => 29,
        "4" => 30,
        "5" => 31,
        "6" => 32,
        "7" => 33,
        "8" => 34,
        "9" => 35,
        "F1" => 36,
        "F2" => 37,
        "F3" => 38,
        "F4" => 39,
        "F5" => 40,
        "F6" => 41,
        "F7" => 42,
        "F8" => 43,
        "F9" => 44,
        "F10" => 45,
        "F11" => 46,
        "F12" => 47,
        "Up" => 48,
        "Down" => 49,
        "Left" => 50,
        "Right" => 51,
        "Shift" => 52,
        "Control" => 53,
        "Alt" => 54,
        "Super" => 55,
        "Space" => 56,
        "Enter" => 57,
        "Tab" => 58,
        "Escape" => 59,
        _ => -1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_key_name_resolves_to_negative_one() {
        assert_eq!(key_code_for_name("Nonexistent"), -1);
        assert_eq!(key_code_for_name("W"), key_code_for_name("W"));
    }

    #[test]
    fn held_key_only_just_pressed_once() {
        let mut input = InputAggregator::new();
        let w = key_code_for_name("W");
        input.key_down(w);
        let first = input.consume_snapshot();
        assert!(first.just_pressed.contains(&InputCode::Key(w)));

        input.end_frame();
        input.key_down(w); // already down: not an edge
        let second = input.consume_snapshot();
        assert!(!second.just_pressed.contains(&InputCode::Key(w)));
        assert!(second.keys_down.contains(&w));
    }

    #[test]
    fn end_frame_clears_deltas_and_edges_but_not_held_state() {
        let mut input = InputAggregator::new();
        let w = key_code_for_name("W");
        input.key_down(w);
        input.mouse_delta(1.0, 2.0);
        input.mouse_wheel(3.0);
        input.end_frame();

        let snapshot = input.consume_snapshot();
        assert!(snapshot.just_pressed.is_empty());
        assert_eq!(snapshot.dx, 0.0);
        assert_eq!(snapshot.wheel, 0.0);
        assert!(snapshot.keys_down.contains(&w));
    }

    #[test]
    fn snapshot_is_stable_across_repeated_calls_within_a_frame() {
        let mut input = InputAggregator::new();
        input.key_down(key_code_for_name("A"));
        let first = input.consume_snapshot();
        input.mouse_moved_to(5.0, 6.0);
        let second = input.consume_snapshot();
        assert_ne!(first.mx, second.mx, "mutating the aggregator after a snapshot must not retroactively change it");
    }
}
