use ratatui::style::Color;

// UI Constants
pub const HEAVY_DOWN_AND_RIGHT: char = '┏';
pub const HEAVY_DOWN_AND_LEFT: char = '┓';
pub const HEAVY_UP_AND_RIGHT: char = '┗';
pub const HEAVY_UP_AND_LEFT: char = '┛';
pub const HEAVY_HORIZONTAL: char = '━';
pub const HEAVY_VERTICAL: char = '┃';

// Brand palette
pub const PRIMARY: Color = Color::Rgb(0x00, 0xA5, 0x99);
pub const SECONDARY: Color = Color::Rgb(0x2D, 0xAD, 0xA4);
pub const TEXT: Color = Color::Rgb(0x28, 0x45, 0x41);
pub const BACKGROUND: Color = Color::Rgb(0xEC, 0xF0, 0xEF);
pub const WHITE: Color = Color::Rgb(0xFF, 0xFF, 0xFF);
pub const ERROR: Color = Color::Rgb(0xC5, 0x30, 0x30);

// Copy
pub const BRAND_HEADER: &str = "PIVDENNY INSIGHTS AGENT";
pub const LOGIN_TITLE: &str = "Pivdenny Insights Agent";
pub const LOGIN_SUBTITLE: &str = "Для доступу звертайтеся до research@pivdenny.com.";
pub const EMAIL_PLACEHOLDER: &str = "Введіть електронну пошту";
pub const PASSWORD_PLACEHOLDER: &str = "Введіть пароль";
pub const SUBMIT_LABEL: &str = "Увійти";
pub const PERSONAS_TITLE: &str = "Оберіть персону";
pub const BACK_LABEL: &str = "назад до персон";
pub const INPUT_PLACEHOLDER: &str = "Поставте запитання";
pub const QUIT_TITLE: &str = " Вихід ";
pub const QUIT_PROMPT: &str = "Ви впевнені, що хочете вийти?\n\n'y' вийти, 'n' залишитися";

/// Substituted for the assistant placeholder whenever a send fails.
pub const APOLOGY_TEXT: &str = "Вибачте, сталася помилка. Спробуйте ще раз.";

// API Constants
pub const DEFAULT_WEBHOOK_URL: &str =
    "https://ivan-m.app.n8n.cloud/webhook/56ccfe3e-feb3-4712-a9e3-b25be1d7b87a";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RELOAD_DELAY_MS: u64 = 2000;
pub const SESSIONS_TABLE: &str = "chat_sessions";
pub const MESSAGES_VIEW: &str = "chat_messages_view";
