//! Timeline assembly: the last compilation step.

use crate::compiler::CompilerOutput;
use crate::error::OmniError;
use crate::score::{CompiledScore, NoteEvent, Tick};

/// Sort the events by start tick (ties keep production order) and compute the
/// total length. Fails only if an event ends before it starts, which the
/// compiler never produces.
pub fn assemble(output: CompilerOutput) -> Result<CompiledScore, OmniError> {
    let CompilerOutput {
        meta,
        instruments,
        groups,
        mut events,
        ..
    } = output;

    if let Some(bad) = events.iter().find(|e| e.tick_end < e.tick_start) {
        return Err(OmniError::Internal(format!(
            "event of '{}'/'{}' in measure {} ends at tick {} before its start at {}",
            bad.instrument_id, bad.voice_id, bad.measure, bad.tick_end, bad.tick_start
        )));
    }

    events.sort_by_key(|e| e.tick_start);
    let duration_ticks = total_duration(&events);

    Ok(CompiledScore {
        meta,
        instruments,
        groups,
        timeline: events,
        duration_ticks,
    })
}

fn total_duration(events: &[NoteEvent]) -> Tick {
    events.iter().map(|e| e.tick_end).max().unwrap_or(0)
}
