use serde::Deserialize;

// Account V1 response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    pub puuid: String,
    #[serde(default)]
    pub game_name: Option<String>,
    #[serde(default)]
    pub tag_line: Option<String>,
}

// Summoner V4 response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummonerDto {
    pub puuid: String,
    pub summoner_level: i64,
    #[serde(default)]
    pub profile_icon_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

// Match V5 response
#[derive(Debug, Deserialize)]
pub struct MatchDto {
    pub metadata: MatchMetadata,
    pub info: MatchInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchMetadata {
    pub match_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInfo {
    #[serde(default)]
    pub queue_id: i64,
    #[serde(default)]
    pub game_mode: String,
    pub game_duration: i64,
    pub game_creation: i64,
    #[serde(default)]
    pub game_start_timestamp: Option<i64>,
    pub participants: Vec<ParticipantDto>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub puuid: String,
    pub champion_name: String,
    #[serde(default)]
    pub champ_level: i64,
    pub kills: i64,
    pub deaths: i64,
    pub assists: i64,
    pub win: bool,
    #[serde(default)]
    pub item0: i64,
    #[serde(default)]
    pub item1: i64,
    #[serde(default)]
    pub item2: i64,
    #[serde(default)]
    pub item3: i64,
    #[serde(default)]
    pub item4: i64,
    #[serde(default)]
    pub item5: i64,
    #[serde(default)]
    pub item6: i64,
    #[serde(default)]
    pub total_damage_dealt_to_champions: i64,
    #[serde(default)]
    pub gold_earned: i64,
    #[serde(default)]
    pub vision_score: i64,
}

impl ParticipantDto {
    pub fn items(&self) -> [i64; 7] {
        [
            self.item0, self.item1, self.item2, self.item3, self.item4, self.item5,
            self.item6,
        ]
    }
}

impl MatchDto {
    /// Finds the queried player among the participants.
    pub fn participant_by_puuid(&self, puuid: &str) -> Option<&ParticipantDto> {
        self.info.participants.iter().find(|p| p.puuid == puuid)
    }
}
