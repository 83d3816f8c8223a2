//! Line-oriented editing session.
//!
//! Reads one command per line from a terminal or a script file and applies
//! it to a [`ModelStore`]. Rejected edits print the blocking user message and
//! leave the model as it was.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use beam_core::editing::{DistributedPlacement, EditCommand, ModelStore};
use beam_core::file_io::save_json;
use beam_core::model::Direction;
use beam_core::{CalcError, CalcResult};

pub const HELP: &str = "\
Commands:
  pillar W POS               add a pillar (width, position in cm)
  cantilever W H LEN DIR     add a cantilever, DIR = left | right
  rm-pillar ID               remove a corner pillar
  rm-beam ID                 remove a beam
  point POS MAG              add a point load (kN, negative is downward)
  dist START END MAG         add a distributed load over an interval (kN/m)
  dist-beam BEAM MAG         add a distributed load over a whole beam
  reset [-y]                 clear the structure (asks for confirmation)
  show                       print the current model as JSON
  save FILE                  write the current model to FILE
  help                       this text
  quit                       leave the session";

#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Edit(EditCommand),
    Reset { confirmed: bool },
    Show,
    Save(PathBuf),
    Help,
    Quit,
}

fn number(args: &[&str], index: usize, field: &str) -> CalcResult<f64> {
    let raw = args
        .get(index)
        .ok_or_else(|| CalcError::invalid_input(field, "", "missing value"))?;
    raw.parse()
        .map_err(|_| CalcError::invalid_input(field, *raw, "not a number"))
}

fn text(args: &[&str], index: usize, field: &str) -> CalcResult<String> {
    args.get(index)
        .map(|s| s.to_string())
        .ok_or_else(|| CalcError::invalid_input(field, "", "missing value"))
}

/// Parse one input line; `Ok(None)` for blank lines and `#` comments
pub fn parse_line(line: &str) -> CalcResult<Option<ReplCommand>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let parts: Vec<&str> = line.split_whitespace().collect();
    let (name, args) = (parts[0], &parts[1..]);

    let command = match name.to_ascii_lowercase().as_str() {
        "pillar" => ReplCommand::Edit(EditCommand::AddPillar {
            width: number(args, 0, "width")?,
            position: number(args, 1, "position")?,
        }),
        "cantilever" => ReplCommand::Edit(EditCommand::AddCantilever {
            width: number(args, 0, "width")?,
            height: number(args, 1, "height")?,
            length: number(args, 2, "length")?,
            direction: text(args, 3, "direction")?.parse::<Direction>()?,
        }),
        "rm-pillar" => ReplCommand::Edit(EditCommand::RemovePillar { id: text(args, 0, "id")? }),
        "rm-beam" => ReplCommand::Edit(EditCommand::RemoveBeam { id: text(args, 0, "id")? }),
        "point" => ReplCommand::Edit(EditCommand::AddPointLoad {
            position: number(args, 0, "position")?,
            magnitude: number(args, 1, "magnitude")?,
        }),
        "dist" => ReplCommand::Edit(EditCommand::AddDistributedLoad {
            magnitude: number(args, 2, "magnitude")?,
            placement: DistributedPlacement::ByPosition {
                start_position: number(args, 0, "startPosition")?,
                end_position: number(args, 1, "endPosition")?,
            },
        }),
        "dist-beam" => ReplCommand::Edit(EditCommand::AddDistributedLoad {
            magnitude: number(args, 1, "magnitude")?,
            placement: DistributedPlacement::ByBeam { beam_id: text(args, 0, "beamId")? },
        }),
        "reset" => ReplCommand::Reset {
            confirmed: args.iter().any(|a| matches!(*a, "-y" | "--yes")),
        },
        "show" => ReplCommand::Show,
        "save" => ReplCommand::Save(PathBuf::from(text(args, 0, "file")?)),
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" | "q" => ReplCommand::Quit,
        other => return Err(CalcError::invalid_input("command", other, "unknown command, try 'help'")),
    };
    Ok(Some(command))
}

/// Editing session over a model store
pub struct Session {
    store: ModelStore,
    interactive: bool,
}

impl Session {
    pub fn new(store: ModelStore, interactive: bool) -> Self {
        Self { store, interactive }
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    fn summary(&self) -> String {
        let m = self.store.model();
        format!(
            "v{}: {} pillars, {} beams, {} point loads, {} distributed loads",
            self.store.version(),
            m.pillars.len(),
            m.beams.len(),
            m.point_loads.len(),
            m.distributed_loads.len()
        )
    }

    /// Ids after renumbering, so the user can address the new members
    fn member_ids(&self) -> String {
        let m = self.store.model();
        let pillars: Vec<&str> = m.pillars.iter().map(|p| p.id.as_str()).collect();
        let beams: Vec<&str> = m.beams.iter().map(|b| b.id.as_str()).collect();
        format!("pillars [{}] beams [{}]", pillars.join(" "), beams.join(" "))
    }

    fn confirm<R: BufRead, W: Write>(&self, input: &mut R, out: &mut W) -> io::Result<bool> {
        if !self.interactive {
            return Ok(false);
        }
        write!(out, "Clear the whole structure? [y/N]: ")?;
        out.flush()?;
        let mut answer = String::new();
        input.read_line(&mut answer)?;
        Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes" | "s" | "sim"))
    }

    /// Run one parsed command. Returns `false` when the session should end.
    fn execute<R: BufRead, W: Write>(&mut self, command: ReplCommand, input: &mut R, out: &mut W) -> io::Result<bool> {
        match command {
            ReplCommand::Edit(edit) => match self.store.apply(&edit) {
                Ok(_) => {
                    writeln!(out, "ok {}", self.summary())?;
                    if edit.is_structural() {
                        writeln!(out, "   {}", self.member_ids())?;
                    }
                }
                Err(e) => writeln!(out, "Error: {}", e.user_message())?,
            },
            ReplCommand::Reset { confirmed } => {
                if confirmed || self.confirm(input, out)? {
                    match self.store.apply(&EditCommand::Reset) {
                        Ok(_) => writeln!(out, "ok {}", self.summary())?,
                        Err(e) => writeln!(out, "Error: {}", e.user_message())?,
                    }
                } else {
                    writeln!(out, "Reset cancelled.")?;
                }
            }
            ReplCommand::Show => match serde_json::to_string_pretty(self.store.model()) {
                Ok(json) => writeln!(out, "{}", json)?,
                Err(e) => writeln!(out, "Error: {}", e)?,
            },
            ReplCommand::Save(path) => match save_json(self.store.model(), &path) {
                Ok(()) => writeln!(out, "saved {}", path.display())?,
                Err(e) => writeln!(out, "Error: {}", e.user_message())?,
            },
            ReplCommand::Help => writeln!(out, "{}", HELP)?,
            ReplCommand::Quit => return Ok(false),
        }
        Ok(true)
    }

    /// Read lines until `quit` or end of input
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, mut out: W) -> io::Result<()> {
        loop {
            if self.interactive {
                write!(out, "beam> ")?;
                out.flush()?;
            }
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            match parse_line(&line) {
                Ok(None) => {}
                Ok(Some(command)) => {
                    if !self.execute(command, &mut input, &mut out)? {
                        break;
                    }
                }
                Err(e) => writeln!(out, "Error: {}", e.user_message())?,
            }
        }
        Ok(())
    }
}
