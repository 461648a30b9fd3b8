//! Keycode name table
//!
//! Maps Linux kernel keycodes (`KEY_*` in `input-event-codes.h`) to short
//! lowercase names and back. Every code has exactly one canonical name; a
//! handful of names also accept alternate spellings through the alias table.
//!
//! The table is built once on first use and shared read-only afterwards:
//!
//! ```
//! use keybridge_daemon::keycodes::{self, Keycode};
//!
//! assert_eq!(keycodes::table().name(Keycode(30)), Some("a"));
//! assert_eq!(keycodes::table().resolve("ret"), Some(Keycode(28)));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::Serialize;

/// A Linux kernel keycode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Keycode(pub u16);

impl Keycode {
    /// Canonical name of this code, if the table knows it.
    pub fn name(self) -> Option<&'static str> {
        table().name(self)
    }

    /// Look up a code by canonical name or alias.
    pub fn from_name(name: &str) -> Option<Self> {
        table().resolve(name)
    }
}

impl From<u16> for Keycode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl From<Keycode> for u16 {
    fn from(code: Keycode) -> Self {
        code.0
    }
}

impl fmt::Display for Keycode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "<{}>", self.0),
        }
    }
}

/// Error returned when a string names no known key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown key: '{0}'")]
pub struct UnknownKey(pub String);

impl FromStr for Keycode {
    type Err = UnknownKey;

    /// Accepts canonical names, aliases, or a plain decimal code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(code) = Self::from_name(s) {
            return Ok(code);
        }
        s.parse::<u16>()
            .map(Keycode)
            .map_err(|_| UnknownKey(s.to_string()))
    }
}

/// Immutable code <-> name mapping with alias resolution.
#[derive(Debug)]
pub struct KeycodeTable {
    by_code: HashMap<Keycode, &'static str>,
    by_name: HashMap<&'static str, Keycode>,
    aliases: HashMap<&'static str, &'static str>,
}

impl KeycodeTable {
    fn build() -> Self {
        let mut by_code = HashMap::with_capacity(KEY_NAMES.len());
        let mut by_name = HashMap::with_capacity(KEY_NAMES.len());
        for &(code, name) in KEY_NAMES {
            by_code.insert(Keycode(code), name);
            by_name.insert(name, Keycode(code));
        }

        let mut aliases = HashMap::new();
        for &(canonical, alts) in ALIASES {
            for alt in alts {
                aliases.insert(*alt, canonical);
            }
        }

        Self {
            by_code,
            by_name,
            aliases,
        }
    }

    /// Canonical name for `code`.
    pub fn name(&self, code: Keycode) -> Option<&'static str> {
        self.by_code.get(&code).copied()
    }

    /// Resolve a name to its canonical spelling, trying canonical names
    /// before aliases. Matching ignores ASCII case.
    pub fn canonical(&self, name: &str) -> Option<&'static str> {
        let lower = name.to_ascii_lowercase();
        if let Some((canonical, _)) = self.by_name.get_key_value(lower.as_str()) {
            return Some(*canonical);
        }
        self.aliases.get(lower.as_str()).copied()
    }

    /// Resolve a canonical name or alias to its code.
    pub fn resolve(&self, name: &str) -> Option<Keycode> {
        self.canonical(name)
            .and_then(|canonical| self.by_name.get(canonical).copied())
    }

    /// Aliases accepted for a canonical name.
    pub fn aliases_of(&self, canonical: &str) -> &'static [&'static str] {
        ALIASES
            .iter()
            .find(|(name, _)| *name == canonical)
            .map(|(_, alts)| *alts)
            .unwrap_or(&[])
    }

    /// All (code, canonical name) pairs in ascending code order.
    pub fn iter(&self) -> impl Iterator<Item = (Keycode, &'static str)> {
        KEY_NAMES.iter().map(|&(code, name)| (Keycode(code), name))
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

/// The process-wide keycode table.
pub fn table() -> &'static KeycodeTable {
    static TABLE: OnceLock<KeycodeTable> = OnceLock::new();
    TABLE.get_or_init(KeycodeTable::build)
}

/// Highest code in the standard keyboard range.
pub const KEY_MAX_STANDARD: u16 = 248;

#[rustfmt::skip]
const KEY_NAMES: &[(u16, &str)] = &[
    (1, "esc"), (2, "1"), (3, "2"), (4, "3"), (5, "4"), (6, "5"), (7, "6"),
    (8, "7"), (9, "8"), (10, "9"), (11, "0"), (12, "minus"), (13, "equal"),
    (14, "backspace"), (15, "tab"), (16, "q"), (17, "w"), (18, "e"), (19, "r"),
    (20, "t"), (21, "y"), (22, "u"), (23, "i"), (24, "o"), (25, "p"),
    (26, "leftbrace"), (27, "rightbrace"), (28, "enter"), (29, "leftctrl"),
    (30, "a"), (31, "s"), (32, "d"), (33, "f"), (34, "g"), (35, "h"), (36, "j"),
    (37, "k"), (38, "l"), (39, "semicolon"), (40, "apostrophe"), (41, "grave"),
    (42, "leftshift"), (43, "backslash"), (44, "z"), (45, "x"), (46, "c"),
    (47, "v"), (48, "b"), (49, "n"), (50, "m"), (51, "comma"), (52, "dot"),
    (53, "slash"), (54, "rightshift"), (55, "kpasterisk"), (56, "leftalt"),
    (57, "space"), (58, "capslock"),
    (59, "f1"), (60, "f2"), (61, "f3"), (62, "f4"), (63, "f5"), (64, "f6"),
    (65, "f7"), (66, "f8"), (67, "f9"), (68, "f10"),
    (69, "numlock"), (70, "scrolllock"), (71, "kp7"), (72, "kp8"), (73, "kp9"),
    (74, "kpminus"), (75, "kp4"), (76, "kp5"), (77, "kp6"), (78, "kpplus"),
    (79, "kp1"), (80, "kp2"), (81, "kp3"), (82, "kp0"), (83, "kpdot"),
    (85, "zenkakuhankaku"), (86, "102nd"), (87, "f11"), (88, "f12"), (89, "ro"),
    (90, "kata"), (91, "hira"), (92, "henkan"), (93, "katakanahiragana"),
    (94, "muhenkan"), (95, "kpjpcomma"), (96, "kpenter"), (97, "rightctrl"),
    (98, "kpslash"), (99, "sysrq"), (100, "rightalt"), (101, "linefeed"),
    (102, "home"), (103, "up"), (104, "pageup"), (105, "left"), (106, "right"),
    (107, "end"), (108, "down"), (109, "pagedown"), (110, "insert"),
    (111, "delete"), (112, "macro"), (113, "mute"), (114, "volumedown"),
    (115, "volumeup"), (116, "power"), (117, "kpequal"), (118, "kpplusminus"),
    (119, "pause"), (120, "scale"), (121, "kpcomma"), (122, "hangeul"),
    (123, "hanja"), (124, "yen"), (125, "leftmeta"), (126, "rightmeta"),
    (127, "compose"), (128, "stop"), (129, "again"), (130, "props"),
    (131, "undo"), (132, "front"), (133, "copy"), (134, "open"), (135, "paste"),
    (136, "find"), (137, "cut"), (138, "help"), (139, "menu"), (140, "calc"),
    (141, "setup"), (142, "sleep"), (143, "wakeup"), (144, "file"),
    (145, "sendfile"), (146, "deletefile"), (147, "xfer"), (148, "prog1"),
    (149, "prog2"), (150, "www"), (151, "msdos"), (152, "coffee"),
    (153, "rotatedisplay"), (154, "cyclewindows"), (155, "mail"),
    (156, "bookmarks"), (157, "computer"), (158, "back"), (159, "forward"),
    (160, "closecd"), (161, "ejectcd"), (162, "ejectclosecd"),
    (163, "nextsong"), (164, "playpause"), (165, "previoussong"),
    (166, "stopcd"), (167, "record"), (168, "rewind"), (169, "phone"),
    (170, "iso"), (171, "config"), (172, "homepage"), (173, "refresh"),
    (174, "exit"), (175, "move"), (176, "edit"), (177, "scrollup"),
    (178, "scrolldown"), (179, "kpleftparen"), (180, "kprightparen"),
    (181, "new"), (182, "redo"),
    (183, "f13"), (184, "f14"), (185, "f15"), (186, "f16"), (187, "f17"),
    (188, "f18"), (189, "f19"), (190, "f20"), (191, "f21"), (192, "f22"),
    (193, "f23"), (194, "f24"),
    (200, "playcd"), (201, "pausecd"), (202, "prog3"), (203, "prog4"),
    (204, "dashboard"), (205, "suspend"), (206, "close"), (207, "play"),
    (208, "fastforward"), (209, "bassboost"), (210, "print"), (211, "hp"),
    (212, "camera"), (213, "sound"), (214, "question"), (215, "email"),
    (216, "chat"), (217, "search"), (218, "connect"), (219, "finance"),
    (220, "sport"), (221, "shop"), (222, "alterase"), (223, "cancel"),
    (224, "brightnessdown"), (225, "brightnessup"), (226, "media"),
    (227, "switchvideomode"), (228, "kbdillumtoggle"), (229, "kbdillumdown"),
    (230, "kbdillumup"), (231, "send"), (232, "reply"), (233, "forwardmail"),
    (234, "save"), (235, "documents"), (236, "battery"), (237, "bluetooth"),
    (238, "wlan"), (239, "uwb"), (240, "unknown"), (241, "videonext"),
    (242, "videoprev"), (243, "brightnesscycle"), (244, "brightnessauto"),
    (245, "displayoff"), (246, "wwan"), (247, "rfkill"), (248, "micmute"),
];

#[rustfmt::skip]
const ALIASES: &[(&str, &[&str])] = &[
    ("enter", &["ret", "return", "ent"]),
    ("esc", &["escape"]),
    ("minus", &["min", "-"]),
    ("equal", &["eql", "="]),
    ("sleep", &["zzz"]),
    ("space", &["spc"]),
    ("pageup", &["pgup"]),
    ("pagedown", &["pgdn"]),
    ("insert", &["ins"]),
    ("delete", &["del"]),
    ("volumeup", &["volu"]),
    ("volumedown", &["voldwn", "vold"]),
    ("brightnessup", &["brup", "bru"]),
    ("brightnessdown", &["brdown", "brdwn", "brdn"]),
    ("leftalt", &["lalt", "alt"]),
    ("rightalt", &["ralt"]),
    ("compose", &["comp", "cmps", "cmp"]),
    ("leftshift", &["lshift", "lshft", "lsft", "shft", "sft", "shift"]),
    ("rightshift", &["rshift", "rshft", "rsft"]),
    ("leftctrl", &["lctrl", "lctl", "ctl", "ctrl"]),
    ("rightctrl", &["rctrl", "rctl"]),
    ("leftmeta", &["lmeta", "lmet", "met", "meta", "super"]),
    ("rightmeta", &["rmeta", "rmet"]),
    ("backspace", &["bks", "bspc"]),
    ("capslock", &["caps"]),
    ("grave", &["grv", "`"]),
    ("102nd", &["102d"]),
    ("forward", &["fwd"]),
    ("scrolllock", &["scrlck", "slck"]),
    ("print", &["prnt"]),
    ("wakeup", &["wkup"]),
    ("left", &["lft"]),
    ("right", &["rght"]),
    ("leftbrace", &["lbrc", "["]),
    ("rightbrace", &["rbrc", "]"]),
    ("semicolon", &["scln", ";"]),
    ("apostrophe", &["apos", "'"]),
    ("backslash", &["bksl", "\\"]),
    ("comma", &["comm", ","]),
    ("dot", &["."]),
    ("slash", &["/"]),
    ("numlock", &["nlck"]),
    ("kpslash", &["kp/"]),
    ("kpenter", &["kprt"]),
    ("kpplus", &["kp+"]),
    ("kpasterisk", &["kp*"]),
    ("kpminus", &["kp-"]),
    ("kpdot", &["kp."]),
    ("sysrq", &["ssrq", "sys"]),
    ("kbdillumdown", &["bldn"]),
    ("kbdillumup", &["blup"]),
    ("nextsong", &["next"]),
    ("playpause", &["pp"]),
    ("previoussong", &["prev"]),
    ("micmute", &["micm"]),
    ("coffee", &["lock"]),
    ("hira", &["hiragana", "hiranaga"]),
    ("kata", &["katakana"]),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_code_30_is_a() {
        assert_eq!(table().name(Keycode(30)), Some("a"));
        assert_eq!(Keycode(30).to_string(), "a");
    }

    #[test]
    fn test_alias_resolves_to_canonical() {
        assert_eq!(table().canonical("hiranaga"), Some("hira"));
        assert_eq!(table().canonical("hiragana"), Some("hira"));
        assert_eq!(table().resolve("hiranaga"), Some(Keycode(91)));
    }

    #[test]
    fn test_canonical_names_win_over_aliases() {
        assert_eq!(table().canonical("enter"), Some("enter"));
        assert_eq!(table().canonical("ret"), Some("enter"));
        assert_eq!(table().resolve("ctl"), Some(Keycode(29)));
    }

    #[test]
    fn test_lookup_ignores_case() {
        assert_eq!(table().resolve("CapsLock"), Some(Keycode(58)));
        assert_eq!(table().resolve("ESC"), Some(Keycode(1)));
    }

    #[test]
    fn test_unknown_names_and_codes() {
        assert_eq!(table().resolve("not-a-key"), None);
        assert_eq!(table().name(Keycode(84)), None);
        assert_eq!(Keycode(999).to_string(), "<999>");
    }

    #[test]
    fn test_no_code_has_two_names() {
        let mut seen = HashSet::new();
        for &(code, _) in KEY_NAMES {
            assert!(seen.insert(code), "code {} listed twice", code);
        }
        assert_eq!(table().len(), KEY_NAMES.len());
    }

    #[test]
    fn test_no_name_resolves_to_two_codes() {
        let mut seen = HashSet::new();
        for &(_, name) in KEY_NAMES {
            assert!(seen.insert(name), "canonical name '{}' listed twice", name);
        }
        for &(canonical, alts) in ALIASES {
            assert!(
                table().resolve(canonical).is_some(),
                "alias target '{}' is not a canonical name",
                canonical
            );
            for alt in alts {
                assert!(seen.insert(alt), "alias '{}' collides with another name", alt);
            }
        }
    }

    #[test]
    fn test_codes_stay_in_standard_range() {
        assert!(table().iter().all(|(code, _)| code.0 >= 1 && code.0 <= KEY_MAX_STANDARD));
        let codes: Vec<u16> = table().iter().map(|(code, _)| code.0).collect();
        let mut sorted = codes.clone();
        sorted.sort_unstable();
        assert_eq!(codes, sorted);
    }

    #[test]
    fn test_from_str_accepts_names_aliases_and_numbers() {
        assert_eq!("a".parse::<Keycode>(), Ok(Keycode(30)));
        assert_eq!(" spc ".parse::<Keycode>(), Ok(Keycode(57)));
        assert_eq!("300".parse::<Keycode>(), Ok(Keycode(300)));
        assert_eq!(
            "bogus".parse::<Keycode>(),
            Err(UnknownKey("bogus".to_string()))
        );
    }

    #[test]
    fn test_aliases_of() {
        assert_eq!(table().aliases_of("hira"), &["hiragana", "hiranaga"]);
        assert!(table().aliases_of("a").is_empty());
    }
}
