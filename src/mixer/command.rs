//! Mixer Commands
//!
//! The message form of the mixer's operations. Front ends translate their own
//! events into `Command`s; layer names stay as text so an unknown name can be
//! ignored by the mixer instead of failing in the front end.

use std::fmt;
use std::str::FromStr;

use crate::error::SoundscapeError;
use crate::mixer::layer::Volume;

/// One request to the mixer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start the layer if stopped, stop it if playing
    Toggle { layer: String },
    /// Start one layer
    Play { layer: String },
    /// Stop one layer
    Stop { layer: String },
    /// Change one layer's volume
    SetVolume { layer: String, volume: Volume },
    /// Start every layer with a non-zero volume
    PlayAll,
    /// Stop every layer
    StopAll,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Toggle { layer } => write!(f, "toggle {}", layer),
            Command::Play { layer } => write!(f, "play {}", layer),
            Command::Stop { layer } => write!(f, "stop {}", layer),
            Command::SetVolume { layer, volume } => {
                write!(f, "volume {} {}", layer, volume.percent())
            }
            Command::PlayAll => write!(f, "play-all"),
            Command::StopAll => write!(f, "stop-all"),
        }
    }
}

/// Parses the text form: `toggle <layer>`, `play <layer>`, `stop <layer>`,
/// `volume <layer> <percent>`, `play-all`, `stop-all`.
impl FromStr for Command {
    type Err = SoundscapeError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| SoundscapeError::InvalidCommand {
            line: line.to_string(),
            reason: reason.to_string(),
        };

        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            ["toggle", layer] => Ok(Command::Toggle {
                layer: layer.to_string(),
            }),
            ["play", layer] => Ok(Command::Play {
                layer: layer.to_string(),
            }),
            ["stop", layer] => Ok(Command::Stop {
                layer: layer.to_string(),
            }),
            ["volume", layer, volume] => Ok(Command::SetVolume {
                layer: layer.to_string(),
                volume: volume.parse()?,
            }),
            ["play-all"] => Ok(Command::PlayAll),
            ["stop-all"] => Ok(Command::StopAll),
            [] => Err(invalid("empty command")),
            ["toggle" | "play" | "stop", ..] => Err(invalid("expected one layer name")),
            ["volume", ..] => Err(invalid("expected a layer name and a volume")),
            _ => Err(invalid("unknown command")),
        }
    }
}
