//! Command prompt (`:`) parsing.
//!
//! ```text
//! feed cookie            say hei alle sammen     ask hva er klokka?
//! volume 60              fan auto                sleep 30 / wake
//! contact Arne;+47 123;brother;7                 memory limit=5 threshold=0.4
//! ```

use thiserror::Error;

use crate::actions::{ContactDraft, FanMode, FoodType, MemorySettingsDraft, UserAction};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Action(UserAction),
    /// Speak the last ask-AI answer.
    SpeakAnswer,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

fn number<T: std::str::FromStr>(arg: &str, usage: &'static str) -> Result<T, CommandError> {
    arg.trim().parse().map_err(|_| CommandError::Usage(usage))
}

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((v, r)) => (v, r.trim()),
        None => (line, ""),
    };
    let action = match verb {
        "feed" => UserAction::Feed(match rest {
            "cookie" | "" => FoodType::Cookie,
            "pizza" => FoodType::Pizza,
            _ => return Err(CommandError::Usage("feed cookie|pizza")),
        }),
        "say" | "speak" => UserAction::Speak(rest.to_string()),
        "ask" => UserAction::AskAi(rest.to_string()),
        "speak-answer" => return Ok(Command::SpeakAnswer),
        "control" => UserAction::Control(rest.to_string()),
        "beak" => UserAction::ChangeBeak(rest.to_string()),
        "personality" => UserAction::ChangePersonality(rest.to_string()),
        "voice" => UserAction::ChangeVoice(rest.to_string()),
        "model" => UserAction::ChangeModel(rest.to_string()),
        "volume" => UserAction::ChangeVolume(number(rest, "volume 0-100")?),
        "speed" => UserAction::ChangeSpeed(number(rest, "speed 0-100")?),
        "fan" => UserAction::SetFanMode(match rest {
            "auto" => FanMode::Auto,
            "on" => FanMode::On,
            "off" => FanMode::Off,
            _ => return Err(CommandError::Usage("fan auto|on|off")),
        }),
        "converse" => UserAction::StartConversation,
        "test-beak" => UserAction::TestBeak,
        "play" => UserAction::PlaySong(rest.to_string()),
        "stop" => UserAction::StopSong,
        "user" => UserAction::SwitchUser(rest.to_string()),
        "sleep" => UserAction::EnableSleep {
            minutes: number(rest, "sleep <minutes>")?,
        },
        "wake" => UserAction::DisableSleep,
        "backup" => UserAction::StartBackup,
        "reboot" => UserAction::Reboot,
        "shutdown" => UserAction::Shutdown,
        "portal" => UserAction::StartPortal,
        "max-facts" => UserAction::SetMaxContextFacts(number(rest, "max-facts 1-100")?),
        "memory" => UserAction::SetMemorySettings(parse_memory(rest)?),
        "contact" => UserAction::SaveContact(parse_contact(rest)?),
        "delete-fact" => UserAction::DeleteFact(rest.to_string()),
        "delete-memory" => UserAction::DeleteMemory(number(rest, "delete-memory <id>")?),
        "delete-contact" => UserAction::DeleteContact(number(rest, "delete-contact <id>")?),
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Command::Action(action))
}

const CONTACT_USAGE: &str = "contact [#id;]name;phone[;relation[;priority]]";

fn parse_contact(rest: &str) -> Result<ContactDraft, CommandError> {
    let mut fields: Vec<&str> = rest.split(';').map(str::trim).collect();
    let id = match fields.first().and_then(|f| f.strip_prefix('#')) {
        Some(id) => {
            let id = number(id, CONTACT_USAGE)?;
            fields.remove(0);
            Some(id)
        }
        None => None,
    };
    if fields.len() < 2 || fields.len() > 4 {
        return Err(CommandError::Usage(CONTACT_USAGE));
    }
    let priority = match fields.get(3) {
        Some(p) if !p.is_empty() => Some(number(p, CONTACT_USAGE)?),
        _ => None,
    };
    Ok(ContactDraft {
        id,
        name: fields[0].to_string(),
        phone: fields[1].to_string(),
        relation: fields.get(2).map(|r| r.to_string()).unwrap_or_default(),
        priority,
    })
}

const MEMORY_USAGE: &str = "memory [search=N] [limit=N] [threshold=0.0-1.0]";

fn parse_memory(rest: &str) -> Result<MemorySettingsDraft, CommandError> {
    let mut draft = MemorySettingsDraft::default();
    for pair in rest.split_whitespace() {
        let (key, value) = pair
            .split_once('=')
            .ok_or(CommandError::Usage(MEMORY_USAGE))?;
        match key {
            "search" => draft.embedding_search_limit = Some(number(value, MEMORY_USAGE)?),
            "limit" => draft.memory_limit = Some(number(value, MEMORY_USAGE)?),
            "threshold" => draft.memory_threshold = Some(number(value, MEMORY_USAGE)?),
            _ => return Err(CommandError::Usage(MEMORY_USAGE)),
        }
    }
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(line: &str) -> UserAction {
        match parse_command(line) {
            Ok(Command::Action(a)) => a,
            other => panic!("{:?} -> {:?}", line, other),
        }
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(action("feed pizza"), UserAction::Feed(FoodType::Pizza));
        assert_eq!(action("  say  hei alle sammen "), UserAction::Speak("hei alle sammen".into()));
        assert_eq!(action("volume 60"), UserAction::ChangeVolume(60));
        assert_eq!(action("sleep 30"), UserAction::EnableSleep { minutes: 30 });
        assert_eq!(action("fan off"), UserAction::SetFanMode(FanMode::Off));
        assert_eq!(action("delete-fact user_name"), UserAction::DeleteFact("user_name".into()));
        assert_eq!(parse_command("speak-answer"), Ok(Command::SpeakAnswer));
    }

    #[test]
    fn test_empty_text_left_to_validation() {
        assert_eq!(action("say"), UserAction::Speak(String::new()));
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse_command("quack"), Err(CommandError::Unknown("quack".into())));
        assert!(matches!(parse_command("volume loud"), Err(CommandError::Usage(_))));
        assert!(matches!(parse_command("fan max"), Err(CommandError::Usage(_))));
        assert!(matches!(parse_command("contact Arne"), Err(CommandError::Usage(_))));
    }

    #[test]
    fn test_contact() {
        assert_eq!(
            action("contact #4; Arne ;+47 123;brother;7"),
            UserAction::SaveContact(ContactDraft {
                id: Some(4),
                name: "Arne".into(),
                phone: "+47 123".into(),
                relation: "brother".into(),
                priority: Some(7),
            })
        );
        assert_eq!(
            action("contact Rigmor;999"),
            UserAction::SaveContact(ContactDraft {
                name: "Rigmor".into(),
                phone: "999".into(),
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_memory_settings() {
        assert_eq!(
            action("memory limit=5 threshold=0.4"),
            UserAction::SetMemorySettings(MemorySettingsDraft {
                embedding_search_limit: None,
                memory_limit: Some(5),
                memory_threshold: Some(0.4),
            })
        );
    }
}
