use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::validation::{parse_body, validate_id, validate_year_range};
use super::{
    ApiError, ApiResponse, AppState, HiddenYearDto, HiddenYearsDto, RoleRankDto, RolesDto,
    RosterDto, RosterMemberDto, YearRangesDto,
};
use crate::services::NewMember;
use crate::services::roster_service::{RankedMember, select_default_range};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembersQuery {
    pub year_range: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearVisibilityRequest {
    pub year_range: String,
    pub hidden: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleDeleteRequest {
    pub year_range: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMemberRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub profile_link: String,
    #[serde(default)]
    pub year_range: String,
    /// Base64 image, optionally as a `data:` URL.
    #[serde(default)]
    pub image: String,
}

#[derive(Debug, Serialize)]
pub struct MemberEnvelope {
    pub member: RosterMemberDto,
}

#[derive(Debug, Serialize)]
pub struct RoleEnvelope {
    pub role: RoleRankDto,
}

/// GET /roster/year-ranges
/// Distinct year ranges, newest first, plus the one to show by default
pub async fn list_year_ranges(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<YearRangesDto>>, ApiError> {
    let year_ranges = state.roster().list_year_ranges().await?;
    let default_range = select_default_range(&year_ranges);

    Ok(Json(ApiResponse::success(YearRangesDto {
        year_ranges,
        default_range,
    })))
}

/// GET /roster/members?yearRange=YYYY-YYYY
pub async fn list_members(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MembersQuery>,
) -> Result<Json<ApiResponse<RosterDto>>, ApiError> {
    let year = validate_year_range(query.year_range.as_deref().unwrap_or_default())?;

    let view = state.roster().list_members(year.as_str()).await?;
    if view.members.is_empty() {
        return Err(ApiError::NotFound(format!(
            "No users found for the year range {year}"
        )));
    }

    Ok(Json(ApiResponse::success(RosterDto {
        year_range: view.year_range,
        hidden: view.hidden,
        show_toggle_delete: view.show_toggle_delete,
        users: view.members.into_iter().map(RosterMemberDto::from).collect(),
    })))
}

/// POST /roster/members
pub async fn add_member(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewMemberRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<MemberEnvelope>>), ApiError> {
    let payload = parse_body(payload)?;

    let member = state
        .roster()
        .insert_member(NewMember {
            name: payload.name,
            email: payload.email,
            role: payload.role,
            department: payload.department,
            profile_link: payload.profile_link,
            year_range: payload.year_range,
            image: payload.image,
        })
        .await?;

    let ranks = state.store().role_rank_map().await?;
    let ranked = RankedMember {
        rank: ranks.get(&member.role).copied(),
        member,
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Member added",
            MemberEnvelope {
                member: ranked.into(),
            },
        )),
    ))
}

/// DELETE /roster/members/{id}
pub async fn delete_member(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = validate_id(id, "member")?;
    state.roster().delete_member(id).await?;
    Ok(Json(ApiResponse::ack("Member deleted")))
}

/// POST /roster/year-visibility
pub async fn set_year_visibility(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<YearVisibilityRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let payload = parse_body(payload)?;

    let year = validate_year_range(&payload.year_range)?;
    state
        .roster()
        .set_year_hidden(year.as_str(), payload.hidden)
        .await?;

    let message = if payload.hidden {
        format!("Year {year} hidden")
    } else {
        format!("Year {year} visible")
    };
    Ok(Json(ApiResponse::ack(message)))
}

/// GET /roster/hidden-years
pub async fn list_hidden_years(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<HiddenYearsDto>>, ApiError> {
    let rows = state.roster().hidden_years().await?;
    Ok(Json(ApiResponse::success(HiddenYearsDto {
        hidden_years: rows
            .into_iter()
            .map(|r| HiddenYearDto {
                year_range: r.year_range,
                show_toggle_delete: r.show_toggle_delete,
            })
            .collect(),
    })))
}

/// POST /roster/toggle-delete
/// Hide a year for good and retire its delete toggle
pub async fn hide_toggle_delete(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ToggleDeleteRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let payload = parse_body(payload)?;

    let year = validate_year_range(&payload.year_range)?;
    state.roster().hide_toggle_delete(year.as_str()).await?;
    Ok(Json(ApiResponse::ack(format!(
        "Delete toggle hidden for {year}"
    ))))
}

/// GET /roster/role-ranks
pub async fn list_roles(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<RolesDto>>, ApiError> {
    let roles = state.roster().list_roles().await?;
    Ok(Json(ApiResponse::success(RolesDto {
        roles: roles.into_iter().map(RoleRankDto::from).collect(),
    })))
}

/// POST /roster/role-ranks
pub async fn add_role(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RoleRankDto>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<RoleEnvelope>>), ApiError> {
    let payload = parse_body(payload)?;

    let role = state
        .roster()
        .add_role(&payload.role_name, payload.rank)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Role added",
            RoleEnvelope { role: role.into() },
        )),
    ))
}
