//! TwiML voice response documents

use std::fmt::Write as _;

use axum::http::header;
use axum::response::{IntoResponse, Response};

/// Parameters of a `<Record>` instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOptions {
    /// Callback path Twilio posts the finished recording to
    pub action: String,
    /// Maximum recording length in seconds
    pub max_length: u32,
    /// Seconds of silence that end the recording
    pub timeout: u32,
    pub play_beep: bool,
}

/// A single TwiML verb
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    /// Play an audio file by URL
    Play(String),
    /// Speak text with Twilio's built-in voice
    Say { text: String, voice: String },
    Record(RecordOptions),
    /// Bridge the call to a phone number
    Dial(String),
    Hangup,
}

impl Verb {
    /// Whether this verb speaks to the caller
    #[must_use]
    pub const fn is_speech(&self) -> bool {
        matches!(self, Self::Play(_) | Self::Say { .. })
    }
}

/// Ordered list of instructions for the active call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceResponse {
    verbs: Vec<Verb>,
}

impl VoiceResponse {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn play(&mut self, url: impl Into<String>) -> &mut Self {
        self.verbs.push(Verb::Play(url.into()));
        self
    }

    pub fn say(&mut self, text: impl Into<String>, voice: impl Into<String>) -> &mut Self {
        self.verbs.push(Verb::Say {
            text: text.into(),
            voice: voice.into(),
        });
        self
    }

    pub fn record(&mut self, options: RecordOptions) -> &mut Self {
        self.verbs.push(Verb::Record(options));
        self
    }

    pub fn dial(&mut self, number: impl Into<String>) -> &mut Self {
        self.verbs.push(Verb::Dial(number.into()));
        self
    }

    pub fn hangup(&mut self) -> &mut Self {
        self.verbs.push(Verb::Hangup);
        self
    }

    #[must_use]
    pub fn verbs(&self) -> &[Verb] {
        &self.verbs
    }

    /// Render the XML document
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Response>");

        for verb in &self.verbs {
            // Writing to a String cannot fail
            let _ = match verb {
                Verb::Play(url) => write!(xml, "<Play>{}</Play>", escape(url)),
                Verb::Say { text, voice } => write!(
                    xml,
                    "<Say voice=\"{}\">{}</Say>",
                    escape(voice),
                    escape(text)
                ),
                Verb::Record(opts) => write!(
                    xml,
                    "<Record action=\"{}\" method=\"POST\" maxLength=\"{}\" timeout=\"{}\" playBeep=\"{}\"/>",
                    escape(&opts.action),
                    opts.max_length,
                    opts.timeout,
                    opts.play_beep
                ),
                Verb::Dial(number) => write!(xml, "<Dial>{}</Dial>", escape(number)),
                Verb::Hangup => write!(xml, "<Hangup/>"),
            };
        }

        xml.push_str("</Response>");
        xml
    }
}

impl IntoResponse for VoiceResponse {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, "text/xml")], self.to_xml()).into_response()
    }
}

/// Escape text for use in XML content and attribute values
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
