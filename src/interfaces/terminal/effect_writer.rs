use crate::domain::effects::Effect;
use crate::error::Result;
use std::io::Write;

/// Writes effects as JSON lines, one effect per line.
pub struct EffectWriter<W: Write> {
    writer: W,
}

impl<W: Write> EffectWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_effect(&mut self, effect: &Effect) -> Result<()> {
        serde_json::to_writer(&mut self.writer, effect)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
