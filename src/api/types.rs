use serde::{Deserialize, Serialize};

/// Envelope for every JSON response: `success`, an optional `message`, and the
/// payload's own fields alongside them.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

impl ApiResponse<()> {
    /// Success with only a message.
    pub fn ack(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRangesDto {
    pub year_ranges: Vec<String>,
    pub default_range: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterMemberDto {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: String,
    pub department: String,
    pub profile_link: String,
    pub image_url: String,
    pub year_range: String,
    pub rank: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterDto {
    pub year_range: String,
    pub hidden: bool,
    pub show_toggle_delete: bool,
    pub users: Vec<RosterMemberDto>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RoleRankDto {
    pub role_name: String,
    pub rank: i32,
}

#[derive(Debug, Serialize)]
pub struct RolesDto {
    pub roles: Vec<RoleRankDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HiddenYearDto {
    pub year_range: String,
    pub show_toggle_delete: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HiddenYearsDto {
    pub hidden_years: Vec<HiddenYearDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct UsersDto {
    pub users: Vec<AccountDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDto {
    pub id: i32,
    pub event_name: String,
    pub description: String,
    pub event_time: String,
    pub event_speaker: String,
    pub event_location: String,
    pub image_url: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct EventsDto {
    pub events: Vec<EventDto>,
}

#[derive(Debug, Serialize)]
pub struct EventEnvelope {
    pub event: EventDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImageDto {
    pub id: i32,
    pub url: String,
    pub content_type: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct GalleryDto {
    pub images: Vec<GalleryImageDto>,
}

impl From<crate::db::Account> for AccountDto {
    fn from(a: crate::db::Account) -> Self {
        Self {
            id: a.id,
            username: a.username,
            email: a.email,
            created_at: a.created_at,
        }
    }
}

impl From<crate::db::Event> for EventDto {
    fn from(e: crate::db::Event) -> Self {
        Self {
            id: e.id,
            event_name: e.event_name,
            description: e.description,
            event_time: e.event_time,
            event_speaker: e.event_speaker,
            event_location: e.event_location,
            image_url: e.image_url,
            created_at: e.created_at,
        }
    }
}

impl From<crate::db::GalleryImage> for GalleryImageDto {
    fn from(g: crate::db::GalleryImage) -> Self {
        Self {
            id: g.id,
            url: g.url,
            content_type: g.content_type,
            created_at: g.created_at,
        }
    }
}

impl From<crate::db::RoleRank> for RoleRankDto {
    fn from(r: crate::db::RoleRank) -> Self {
        Self {
            role_name: r.role_name,
            rank: r.rank,
        }
    }
}

impl From<crate::services::roster_service::RankedMember> for RosterMemberDto {
    fn from(m: crate::services::roster_service::RankedMember) -> Self {
        Self {
            id: m.member.id,
            name: m.member.name,
            email: m.member.email,
            role: m.member.role,
            department: m.member.department,
            profile_link: m.member.profile_link,
            image_url: m.member.image_url,
            year_range: m.member.year_range,
            rank: m.rank,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_fields_sit_beside_success() {
        let body = ApiResponse::success(YearRangesDto {
            year_ranges: vec!["2023-2024".to_string()],
            default_range: Some("2023-2024".to_string()),
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["yearRanges"][0], "2023-2024");
        assert_eq!(json["defaultRange"], "2023-2024");
        assert!(json.get("message").is_none());
    }

    #[test]
    fn error_envelope_has_message() {
        let json = serde_json::to_value(ApiResponse::<()>::error("nope")).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "message": "nope"}));
    }
}
