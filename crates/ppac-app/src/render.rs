//! Plain-text grid renderer.

use ppac_core::{GenerationFrame, GenerationObserver};
use std::io::Write;
use tracing::warn;

/// Prints every `interval`-th generation as rows of `0`/`1`/`2` codes.
pub struct TextRenderer<W> {
    writer: W,
    interval: u64,
}

impl<W: Write + Send> TextRenderer<W> {
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self::with_interval(writer, 1)
    }

    /// Render only generations divisible by `interval` (treated as at least 1).
    #[must_use]
    pub fn with_interval(writer: W, interval: u64) -> Self {
        Self {
            writer,
            interval: interval.max(1),
        }
    }

    fn render(&mut self, frame: &GenerationFrame<'_>) -> std::io::Result<()> {
        let record = frame.record;
        writeln!(
            self.writer,
            "generation {} (prey {}, predators {})",
            record.generation, record.prey, record.predators
        )?;
        write!(self.writer, "{}", frame.grid)?;
        writeln!(self.writer)?;
        self.writer.flush()
    }
}

impl<W: Write + Send> GenerationObserver for TextRenderer<W> {
    fn on_generation(&mut self, frame: &GenerationFrame<'_>) {
        if !frame.record.generation.is_multiple_of(self.interval) {
            return;
        }
        if let Err(err) = self.render(frame) {
            warn!(
                generation = frame.record.generation,
                error = %err,
                "failed to render generation"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppac_core::{Grid, Probabilities, RuleConfig, ScriptedDraws, Simulation};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn starving_rules() -> RuleConfig {
        RuleConfig {
            probabilities: Probabilities {
                predator_death_rate: 1.0,
                ..Probabilities::default()
            },
            ..RuleConfig::default()
        }
    }

    #[test]
    fn renders_initial_and_committed_generations() {
        let buffer = SharedBuffer::default();
        let grid: Grid = "0 2\n0 0\n".parse().expect("grid");
        let mut sim = Simulation::from_grid(grid, starving_rules(), ScriptedDraws::constant(0.0))
            .expect("simulation")
            .with_observer(Box::new(TextRenderer::new(buffer.clone())));
        sim.iterate(1);

        let output = String::from_utf8(buffer.0.lock().unwrap().clone()).expect("utf8");
        assert_eq!(
            output,
            "generation 0 (prey 0, predators 1)\n0 2\n0 0\n\n\
             generation 1 (prey 0, predators 0)\n0 0\n0 0\n\n"
        );
    }

    #[test]
    fn interval_skips_intermediate_generations() {
        let buffer = SharedBuffer::default();
        let grid: Grid = "1 1\n1 0\n".parse().expect("grid");
        let mut sim =
            Simulation::from_grid(grid, RuleConfig::default(), ScriptedDraws::constant(0.9))
                .expect("simulation")
                .with_observer(Box::new(TextRenderer::with_interval(buffer.clone(), 2)));
        sim.iterate(3);

        let output = String::from_utf8(buffer.0.lock().unwrap().clone()).expect("utf8");
        let headers: Vec<&str> = output
            .lines()
            .filter(|line| line.starts_with("generation"))
            .collect();
        assert_eq!(
            headers,
            vec![
                "generation 0 (prey 3, predators 0)",
                "generation 2 (prey 3, predators 0)"
            ]
        );
    }

    #[test]
    fn write_failures_do_not_stop_the_run() {
        let grid: Grid = "0 2\n1 0\n".parse().expect("grid");
        let mut sim = Simulation::from_grid(grid, starving_rules(), ScriptedDraws::constant(0.5))
            .expect("simulation")
            .with_observer(Box::new(TextRenderer::new(BrokenPipe)));
        assert_eq!(sim.iterate(2), 2);
        assert_eq!(sim.history().len(), 3);
    }
}
