pub struct Keybinds;

impl Default for Keybinds {
    fn default() -> Self {
        Self
    }
}

impl Keybinds {
    pub fn help_text(&self) -> String {
        r#"Keyboard Shortcuts:

Forms:
  Tab / ↓       Next field
  Shift+Tab / ↑ Previous field
  Enter         Submit
  Esc           Close / go back

Login:
  Ctrl + R      Register a new bot

Dashboard:
  s             Settings (Gemini API key)
  c             Cancel subscription
  r             Reactivate subscription
  d             Delete chat history and AI memory
  p             Products
  q             Connect WhatsApp (scan QR)
  Shift + Q     Master session QR (admin)
  n             Register a new bot
  g             Refresh status and chart
  l             Log out

Settings:
  Ctrl + T      Test API key
  Ctrl + E      Show / hide key

Products:
  Ctrl + A / E / D / S   Add / Edit / Delete / Stock

Register:
  Ctrl + T      Next pricing tier
  Ctrl + P      Switch QR / pairing code

Connect:
  r             Retry QR or code
  c             Copy pairing code or share link
  x             Reset master session (admin QR only)

General:
  F1            Toggle this help
  Shift + E     Show latest error details
  Ctrl + Q      Quit
"#
        .to_string()
    }
}
