use path_defence_system_builder::{InputError, PlayerRequest};

/// Player request scheduled ahead of a wave.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ScheduledAction {
    wave: Option<u32>,
    line: String,
    request: PlayerRequest,
}

impl ScheduledAction {
    /// Parses `[<wave>:]<request>`; without a wave prefix the action runs
    /// before the first wave played in this invocation.
    pub(crate) fn parse(text: &str) -> Result<Self, InputError> {
        let (wave, line) = match text.split_once(':') {
            Some((prefix, rest)) => match prefix.trim().parse::<u32>() {
                Ok(wave) => (Some(wave), rest.trim()),
                Err(_) => (None, text.trim()),
            },
            None => (None, text.trim()),
        };
        Ok(Self {
            wave,
            line: line.to_owned(),
            request: line.parse()?,
        })
    }

    /// Whether the action runs right before `wave`.
    pub(crate) fn is_due(&self, wave: u32, first_wave: u32) -> bool {
        self.wave.unwrap_or(first_wave) == wave
    }

    /// Request text as typed, without the wave prefix.
    pub(crate) fn line(&self) -> &str {
        &self.line
    }

    /// Parsed request.
    pub(crate) fn request(&self) -> &PlayerRequest {
        &self.request
    }
}
