//! Built-in troubleshooting guides.
//!
//! Applying a guide adds a system message (tagged with
//! [`GUIDE_CONTEXT_PREFIX`]) that steers the model for the rest of the chat.

use serde::Serialize;

/// Marks the single guide-context system message in a conversation.
pub const GUIDE_CONTEXT_PREFIX: &str = "[Cirrus Guide Context]";

#[derive(Debug, Clone, Serialize)]
pub struct Guide {
    pub id: &'static str,
    pub title: &'static str,
    pub keywords: &'static str,
    pub system_prompt: &'static str,
    pub quick_steps: &'static [&'static str],
    pub content: &'static str,
}

impl Guide {
    /// Content of the guide-context system message.
    pub fn context_message(&self) -> String {
        format!("{GUIDE_CONTEXT_PREFIX}\n{}", self.system_prompt)
    }

    fn matches(&self, query: &str) -> bool {
        self.title.to_lowercase().contains(query) || self.keywords.to_lowercase().contains(query)
    }
}

static CATALOG: &[Guide] = &[Guide {
    id: "factory_reset_windows_pc",
    title: "Factory resetting your PC",
    keywords: "windows reset remove everything local reinstall erase wipe",
    system_prompt: "You are helping with a Windows factory reset workflow. Keep instructions concrete and safe. \
This guide is for Windows PCs and for removing everything with a local reinstall. \
Before destructive actions, remind the user about backups and BitLocker recovery keys. \
Use short numbered steps and ask one diagnostic question at a time if they are stuck.",
    quick_steps: &[
        "Open Settings and go to Recovery",
        "Choose Reset this PC",
        "Select Remove everything",
        "Choose Local reinstall",
        "Review reset options and confirm",
        "Run Windows Update after setup",
    ],
    content: "Diagnosis: This guide is for Windows PCs only.
Use this when you want to delete everything from the computer and do a local reinstall of Windows.

Before you start:
1. Plug the PC into power.
2. Back up anything you need (Desktop, Documents, browser passwords, 2FA backup codes).
3. If BitLocker is enabled, make sure you have your recovery key.
4. Sign in with an administrator account.

Reset steps (Windows 11 / Windows 10):
1. Open Settings.
2. Windows 11: System > Recovery.
   Windows 10: Update & Security > Recovery.
3. Under Reset this PC, click Reset PC (or Get started).
4. Choose Remove everything.
5. Choose Local reinstall.
6. Review Additional settings. If this PC is staying with you, keep clean-data off for speed. If giving away, enable clean-data.
7. Click Next, then Reset.
8. Wait while Windows restarts several times.

After reset:
1. Complete setup.
2. Run Windows Update.
3. Reinstall drivers and apps.
4. Restore your backups.

If reset fails:
- Open Command Prompt (Admin) and run: sfc /scannow
- Then run: DISM /Online /Cleanup-Image /RestoreHealth
- Retry the reset.

Use /guide off to return to a plain chat.",
}];

pub fn catalog() -> &'static [Guide] {
    CATALOG
}

pub fn find_guide(id: &str) -> Option<&'static Guide> {
    CATALOG.iter().find(|guide| guide.id == id)
}

/// Case-insensitive substring search over titles and keywords.
/// A blank query returns the whole catalog.
pub fn search_guides(query: &str) -> Vec<&'static Guide> {
    let query = query.trim().to_lowercase();
    CATALOG
        .iter()
        .filter(|guide| query.is_empty() || guide.matches(&query))
        .collect()
}
