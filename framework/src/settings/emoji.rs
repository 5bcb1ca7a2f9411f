use std::str::FromStr;

use twilight_model::id::{
    marker::{EmojiMarker, GuildMarker},
    Id,
};

use crate::{transport::Transport, Error};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedEmoji {
    Custom {
        id: Id<EmojiMarker>,
        name: String,
        animated: bool,
    },
    Unicode(String),
}

impl ResolvedEmoji {
    /// The (id, name) pair the emoji is stored as, unicode emoji have no id.
    pub fn into_pair(self) -> (Option<String>, String) {
        match self {
            Self::Custom { id, name, .. } => (Some(id.to_string()), name),
            Self::Unicode(emoji) => (None, emoji),
        }
    }
}

pub fn mention(id: &str, name: &str) -> String {
    format!("<:{}:{}>", name, id)
}

fn parse_custom(input: &str) -> Result<Option<ResolvedEmoji>, Error> {
    let re = regex::Regex::new(r"^<(a?):([[:word:]]+):([[:digit:]]+)>$")?;
    let Some(caps) = re.captures(input) else {
        return Ok(None);
    };

    let (_, [animated, name, id]) = caps.extract();
    Ok(Some(ResolvedEmoji::Custom {
        id: Id::<EmojiMarker>::from_str(id)?,
        name: name.to_string(),
        animated: animated == "a",
    }))
}

/// Figure out which emoji the user meant. Tries a custom emoji mention, a
/// unicode emoji, a `:shortcode:` and finally a custom emoji of the guild by name.
pub async fn resolve(
    input: &str,
    guild_id: Id<GuildMarker>,
    transport: &dyn Transport,
) -> Result<Option<ResolvedEmoji>, Error> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    if let Some(custom) = parse_custom(input)? {
        return Ok(Some(custom));
    }

    if let Some(emoji) = emojis::get(input) {
        return Ok(Some(ResolvedEmoji::Unicode(emoji.as_str().to_string())));
    }

    let name = input.trim_matches(':');
    if let Some(emoji) = emojis::get_by_shortcode(name) {
        return Ok(Some(ResolvedEmoji::Unicode(emoji.as_str().to_string())));
    }

    Ok(transport
        .guild_emojis(guild_id)
        .await?
        .into_iter()
        .find(|emoji| emoji.name == name)
        .map(|emoji| ResolvedEmoji::Custom {
            id: emoji.id,
            name: emoji.name,
            animated: emoji.animated,
        }))
}
