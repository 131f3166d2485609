/// Application-name fragments that count as development activity. Matching is
/// plain case-insensitive substring matching on the window title, so an entry
/// also matches titles that merely contain it.
pub const TARGET_APPS: &[&str] = &[
    // IDEs & editors
    "Visual Studio",
    "Code",
    "IntelliJ",
    "PyCharm",
    "CLion",
    "Eclipse",
    "Sublime",
    "Vim",
    "Neovim",
    "Atom",
    "Dev-C++",
    "Qt Creator",
    "Android Studio",
    "Cursor",
    "HBuilder",
    "WebStorm",
    "Rider",
    "Notepad++",
    // Browsers
    "Chrome",
    "Edge",
    "Firefox",
    "Brave",
    "Opera",
    "Safari",
    // Tools
    "DBeaver",
    "Navicat",
    "Postman",
    "Fiddler",
    "Wireshark",
    "Docker",
    "PowerShell",
    "cmd.exe",
    "Terminal",
    "Git",
    "Unity",
    "Unreal",
];

/// Returns true when any whitelist entry occurs as a contiguous substring of
/// the title, ignoring case. An empty title never matches.
pub fn matches_whitelist(title: &str, whitelist: &[&str]) -> bool {
    let title = title.to_lowercase();
    whitelist
        .iter()
        .any(|fragment| title.contains(&fragment.to_lowercase()))
}

/// Classification against the compiled-in whitelist.
pub fn is_tracked(title: &str) -> bool {
    matches_whitelist(title, TARGET_APPS)
}
