//! Block scheduling
//!
//! Drives a [`Bar`] on a single-threaded runtime: blocks run on their
//! intervals, click lines are dispatched as soon as they arrive, and the
//! status line is redrawn after each of those.

use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::Instant;

use crate::bar::Bar;
use crate::block::Interval;
use crate::click::{decode_line, QueueReader};
use crate::error::BarResult;
use crate::registry::BlockId;

/// Upper bound on a single wait, only matters when no block is periodic.
const IDLE_WAIT: Duration = Duration::from_secs(3600);

#[derive(Debug)]
struct Timer {
    block: BlockId,
    period: Duration,
    due: Instant,
}

/// Runs the bar until the click input is closed and no periodic block
/// remains, or until an output error occurs.
pub async fn run<R>(bar: &mut Bar, mut input: R) -> BarResult<()>
where
    R: AsyncBufRead + Unpin,
{
    // static blocks and loading labels
    bar.dump()?;

    let start = Instant::now();
    let mut timers = Vec::new();
    let ids: Vec<BlockId> = bar.blocks().ids().collect();
    for id in ids {
        update_block(bar, id);
        if let Some(Interval::Every(period)) = bar.blocks().get(id).map(|b| b.interval()) {
            timers.push(Timer {
                block: id,
                period,
                due: start + period,
            });
        }
    }
    bar.dump()?;

    tracing::debug!("scheduled {} periodic blocks", timers.len());

    // partial line survives a timer firing mid-read
    let mut pending = Vec::new();
    let mut input_open = true;
    let mut clicks = QueueReader::new();

    loop {
        let next_due = timers.iter().map(|timer| timer.due).min();
        if !input_open && next_due.is_none() {
            tracing::debug!("nothing left to schedule");
            return Ok(());
        }
        let deadline = next_due.unwrap_or_else(|| Instant::now() + IDLE_WAIT);

        tokio::select! {
            read = input.read_until(b'\n', &mut pending), if input_open => {
                if read? == 0 && pending.is_empty() {
                    tracing::debug!("click input closed");
                    input_open = false;
                } else if let Some(line) = decode_line(std::mem::take(&mut pending)) {
                    clicks.push(line);
                    if let Err(err) = bar.click(&mut clicks) {
                        tracing::warn!("click handling failed: {err}");
                    }
                    bar.dump()?;
                }
            }
            () = tokio::time::sleep_until(deadline), if next_due.is_some() => {
                let now = Instant::now();
                for timer in timers.iter_mut().filter(|timer| timer.due <= now) {
                    update_block(bar, timer.block);
                    timer.due = now + timer.period;
                }
                bar.dump()?;
            }
        }
    }
}

fn update_block(bar: &mut Bar, id: BlockId) {
    if let Some(block) = bar.blocks_mut().get_mut(id) {
        // the block already shows what went wrong
        if let Err(err) = block.update() {
            tracing::debug!("{err}");
        }
    }
}
