//! Set completion and the story countdown.

/// What happens when the story countdown runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryExit {
    /// More sets remain: open the next door.
    NextSet,
    /// That was the last set: back to the input step.
    EndGame,
}

/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownOutcome {
    /// No countdown is running (cancelled, or not in the story step).
    Idle,
    /// Seconds left after this tick. Always ≥ 1.
    Remaining(u32),
    /// This tick reached zero; the caller performs the exit.
    Elapsed(StoryExit),
}

/// Decides the door → story and story → door/input transitions.
///
/// Purely a decision-maker: it never sleeps. The game actor feeds it one
/// [`tick`](Self::tick) per second while the story step is showing.
#[derive(Debug, Clone)]
pub struct TransitionScheduler {
    countdown_secs: u32,
    remaining: Option<u32>,
}

impl TransitionScheduler {
    /// Creates a scheduler whose countdowns last `countdown_secs` ticks.
    pub fn new(countdown_secs: u32) -> Self {
        Self {
            countdown_secs: countdown_secs.max(1),
            remaining: None,
        }
    }

    /// A set is complete as soon as the count reaches the target.
    pub fn is_set_complete(&self, movement_count: u64, target_reps: u32) -> bool {
        movement_count >= u64::from(target_reps)
    }

    /// What follows the story after set `current_set` of `target_sets`.
    pub fn exit_after_story(current_set: u32, target_sets: u32) -> StoryExit {
        if current_set < target_sets {
            StoryExit::NextSet
        } else {
            StoryExit::EndGame
        }
    }

    /// Starts (or restarts) the countdown. Returns the starting value.
    pub fn begin_countdown(&mut self) -> u32 {
        self.remaining = Some(self.countdown_secs);
        self.countdown_secs
    }

    /// Counts down one second.
    ///
    /// After exactly `countdown_secs` ticks this returns
    /// [`CountdownOutcome::Elapsed`] once and the countdown stops.
    pub fn tick(&mut self, current_set: u32, target_sets: u32) -> CountdownOutcome {
        let Some(remaining) = self.remaining else {
            return CountdownOutcome::Idle;
        };

        match remaining.saturating_sub(1) {
            0 => {
                self.remaining = None;
                CountdownOutcome::Elapsed(Self::exit_after_story(current_set, target_sets))
            }
            left => {
                self.remaining = Some(left);
                CountdownOutcome::Remaining(left)
            }
        }
    }

    /// Stops any running countdown. Returns `true` if one was running.
    pub fn cancel(&mut self) -> bool {
        self.remaining.take().is_some()
    }

    /// Seconds left, if a countdown is running.
    pub fn remaining(&self) -> Option<u32> {
        self.remaining
    }

    /// The configured countdown length.
    pub fn countdown_secs(&self) -> u32 {
        self.countdown_secs
    }
}
