use tracing::warn;

/// Frame value that marks the end of the played sequence and requests a loop.
pub const LOOP_SENTINEL: u32 = 255;

/// Where playback resumes after the last frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopTo {
    /// `... 255`
    Start,
    /// `... 255 X`: resume at position `X` of the frame list.
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnimationError {
    #[error("invalid character '{found}' in animation token '{token}'")]
    BadCharacter { token: String, found: char },

    #[error("animation frame '{0}' out of range")]
    BadNumber(String),
}

/// A parsed pose list with its playback cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Animation {
    frames: Vec<u32>,
    looping: Option<LoopTo>,
    cursor: usize,
}

impl Animation {
    /// Parse a space-delimited list of frame numbers such as `"1 2 3 255 1"`.
    ///
    /// Returns `Ok(None)` when the list holds no tokens at all. Nothing is
    /// returned unless every token is valid, so a failed parse never leaves a
    /// half-built animation behind.
    pub fn parse(poselist: &str) -> Result<Option<Animation>, AnimationError> {
        let mut values = Vec::new();
        for token in poselist.split(' ').filter(|t| !t.is_empty()) {
            if let Some(found) = token.chars().find(|c| !c.is_ascii_digit()) {
                return Err(AnimationError::BadCharacter {
                    token: token.to_string(),
                    found,
                });
            }
            let value = token
                .parse::<u32>()
                .map_err(|_| AnimationError::BadNumber(token.to_string()))?;
            values.push(value);
        }

        if values.is_empty() {
            return Ok(None);
        }

        let Some(marker) = values.iter().position(|&v| v == LOOP_SENTINEL) else {
            return Ok(Some(Animation::new(values, None)));
        };

        let tail = values.split_off(marker);
        let looping = match &tail[1..] {
            [] => LoopTo::Start,
            [target, rest @ ..] => {
                if !rest.is_empty() {
                    warn!(ignored = rest.len(), "values after the loop target ignored");
                }
                let index = *target as usize;
                if index < values.len() {
                    LoopTo::Index(index)
                } else {
                    warn!(
                        index,
                        frames = values.len(),
                        "loop target out of range; looping to start"
                    );
                    LoopTo::Start
                }
            }
        };
        Ok(Some(Animation::new(values, Some(looping))))
    }

    pub fn new(frames: Vec<u32>, looping: Option<LoopTo>) -> Self {
        Self { frames, looping, cursor: 0 }
    }

    pub fn frames(&self) -> &[u32] {
        &self.frames
    }

    pub fn looping(&self) -> Option<LoopTo> {
        self.looping
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The frame under the cursor, if the list has any frames.
    pub fn current(&self) -> Option<u32> {
        self.frames.get(self.cursor).copied()
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Move the cursor one step. Returns the new frame, or `None` once a
    /// non-looping animation has played out.
    pub fn advance(&mut self) -> Option<u32> {
        if self.frames.is_empty() {
            return None;
        }
        let next = self.cursor + 1;
        if next < self.frames.len() {
            self.cursor = next;
        } else {
            match self.looping {
                Some(LoopTo::Start) => self.cursor = 0,
                Some(LoopTo::Index(i)) => self.cursor = i,
                None => return None,
            }
        }
        self.current()
    }
}
