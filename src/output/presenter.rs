use std::io::{self, Write};

use super::config::{OutputConfig, OutputFormat};
use super::types::Envelope;

pub trait Presenter: Send + Sync {
    fn emit(&self, env: &Envelope, w: &mut dyn Write) -> io::Result<()>;
}

pub struct JsonPresenter { pub pretty: bool }
impl Presenter for JsonPresenter {
    fn emit(&self, env: &Envelope, w: &mut dyn Write) -> io::Result<()> {
        if self.pretty { serde_json::to_writer_pretty(&mut *w, env).map_err(to_io)? } else { serde_json::to_writer(&mut *w, env).map_err(to_io)? }
        writeln!(w)
    }
}

pub struct TextPresenter { pub pretty: bool }
impl Presenter for TextPresenter {
    fn emit(&self, env: &Envelope, w: &mut dyn Write) -> io::Result<()> {
        let label = if env.apply { "Result" } else { "Plan" };
        writeln!(w, "{}: {}", label, env.op)?;
        if self.pretty {
            serde_json::to_writer_pretty(&mut *w, env.payload()).map_err(to_io)?;
            writeln!(w)?;
        }
        Ok(())
    }
}

pub struct Emitter {
    presenter: Box<dyn Presenter>,
}

impl Emitter {
    pub fn from_config(cfg: OutputConfig) -> Self {
        let presenter: Box<dyn Presenter> = match cfg.format {
            OutputFormat::Json => Box::new(JsonPresenter { pretty: cfg.pretty }),
            OutputFormat::Text => Box::new(TextPresenter { pretty: cfg.pretty }),
        };
        Emitter { presenter }
    }

    pub fn emit(&self, env: &Envelope) -> io::Result<()> {
        let mut out = io::stdout();
        self.presenter.emit(env, &mut out)?;
        out.flush()
    }
}

fn to_io(e: serde_json::Error) -> io::Error { io::Error::other(e) }

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_presenter_labels_plan_and_result() {
        let mut buf = Vec::new();
        let p = TextPresenter { pretty: false };
        p.emit(&Envelope::plan("stats", &json!({"years": 2}), None).unwrap(), &mut buf).unwrap();
        p.emit(&Envelope::result("stats", &json!({"rows": 9}), None).unwrap(), &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "Plan: stats\nResult: stats\n");
    }

    #[test]
    fn json_presenter_writes_one_line() {
        let mut buf = Vec::new();
        JsonPresenter { pretty: false }
            .emit(&Envelope::plan("nc", &json!({"elections": 1}), None).unwrap(), &mut buf)
            .unwrap();
        let s = String::from_utf8(buf).unwrap();
        assert_eq!(s.lines().count(), 1);
        assert!(s.contains("\"op\":\"nc\""));
    }
}
