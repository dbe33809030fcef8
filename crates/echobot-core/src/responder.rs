//! Canned replies for commands, free text and button presses.
//!
//! Everything here is pure: text in, text (and maybe a keyboard) out.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Name used in the greeting when the sender has none.
pub const DEFAULT_DISPLAY_NAME: &str = "Foydalanuvchi";

const HELP_TEXT: &str = "📖 Mening buyruqlarim:

/start - Boshlang'ich xabar
/help - Bu xabar
/info - Men haqimda ma'lumot
/echo <text> - Xabarni takrorlash

Shuningdek, qayta ishlanuvchi tugmalar bilan o'ynay olasiz! 🎮";

const INFO_TEXT: &str = "ℹ️ Men haqimda:

Men Rust'da yozilgan bot.
Webhook rejimida ishlayman.
Serverless infrastructureda joylashtirildim.

Muloqotingiz uchun rahmat! ❤️";

/// Reply to `/echo` without an argument.
pub const ECHO_USAGE: &str = "Foydalanish: /echo <sizning xabaringiz>";

/// Reply to a button token the bot never issued.
pub const UNKNOWN_BUTTON: &str = "Noma'lum tugma 🤔";

/// A parsed chat input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request<'a> {
    /// `/start`, greeting the sender by name.
    Start { first_name: Option<&'a str> },
    /// `/help`
    Help,
    /// `/info`
    Info,
    /// `/echo` and its argument, if any.
    Echo(Option<&'a str>),
    /// Any other `/command`; holds the token as typed.
    UnknownCommand(&'a str),
    /// Text that is not a command.
    Text(&'a str),
}

impl<'a> Request<'a> {
    /// Classify a message text.
    ///
    /// Returns `None` for empty or whitespace-only text. The command is the
    /// first whitespace-delimited token; a trailing `@botname` is ignored when
    /// matching.
    pub fn parse(text: &'a str, first_name: Option<&'a str>) -> Option<Self> {
        if text.trim().is_empty() {
            return None;
        }

        // Only the gap after the command is stripped; the argument keeps
        // its own trailing whitespace.
        let body = text.trim_start();
        if !body.starts_with('/') {
            return Some(Request::Text(text));
        }

        let (token, rest) = match body.split_once(char::is_whitespace) {
            Some((token, rest)) => (token, rest.trim_start()),
            None => (body, ""),
        };
        let name = token.split('@').next().unwrap_or(token);

        let request = match name {
            "/start" => Request::Start { first_name },
            "/help" => Request::Help,
            "/info" => Request::Info,
            "/echo" => Request::Echo(Some(rest).filter(|r| !r.is_empty())),
            _ => Request::UnknownCommand(token),
        };
        Some(request)
    }
}

/// What the bot says back.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub buttons: Option<InlineKeyboardMarkup>,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: None,
        }
    }
}

/// Build the reply for a request.
pub fn respond(request: &Request<'_>) -> Reply {
    match *request {
        Request::Start { first_name } => Reply {
            text: greeting(first_name),
            buttons: Some(start_keyboard()),
        },
        Request::Help => Reply::text(HELP_TEXT),
        Request::Info => Reply::text(INFO_TEXT),
        Request::Echo(Some(arg)) => Reply::text(echo(arg)),
        Request::Echo(None) => Reply::text(ECHO_USAGE),
        Request::UnknownCommand(token) => Reply::text(format!(
            "Noma'lum buyruq: {}\n\nBuyruqlar ro'yxati uchun /help ni kiriting.",
            token
        )),
        Request::Text(text) => Reply::text(echo(text)),
    }
}

/// The echo transform: the text, unchanged, followed by the trailer.
pub fn echo(text: &str) -> String {
    format!("Siz yuborganingiz: {} ✅", text)
}

fn greeting(first_name: Option<&str>) -> String {
    let name = first_name
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_DISPLAY_NAME);
    format!(
        "Assalomu alaikum {}! 👋\n\n\
        Men sizning assistant botingiman. Men bilan ham qanday ishlashni keyinroq bilib olasiz!",
        name
    )
}

/// Buttons on the `/start` keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Hello,
    Help,
    Info,
}

impl Button {
    pub const ALL: [Button; 3] = [Button::Hello, Button::Help, Button::Info];

    /// Callback token carried by the button.
    pub fn data(self) -> &'static str {
        match self {
            Button::Hello => "btn_hello",
            Button::Help => "btn_help",
            Button::Info => "btn_info",
        }
    }

    /// Label shown on the button.
    pub fn label(self) -> &'static str {
        match self {
            Button::Hello => "👋 Salom",
            Button::Help => "❓ Yordam",
            Button::Info => "ℹ️ Info",
        }
    }

    /// Acknowledgment sent when the button is pressed.
    pub fn reply(self) -> &'static str {
        match self {
            Button::Hello => "Salom! 👋",
            Button::Help => "Yordam kerakmi? /help buyrug'ini kiriting",
            Button::Info => "Info uchun /info buyrug'ini kiriting",
        }
    }

    pub fn from_data(data: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.data() == data)
    }

    fn to_inline(self) -> InlineKeyboardButton {
        InlineKeyboardButton::callback(self.label(), self.data())
    }
}

/// Keyboard attached to the `/start` greeting: hello and help, then info.
pub fn start_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![Button::Hello.to_inline(), Button::Help.to_inline()],
        vec![Button::Info.to_inline()],
    ])
}

/// Reply text for a pressed button token.
pub fn respond_to_callback(data: &str) -> &'static str {
    Button::from_data(data)
        .map(Button::reply)
        .unwrap_or(UNKNOWN_BUTTON)
}
