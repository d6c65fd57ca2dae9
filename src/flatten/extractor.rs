use crate::flatten::types::{FlatRecord, FlattenError};
use log::{debug, error};
use serde_json::{Map, Value};

/// Observation attributes copied verbatim when present, null otherwise
const DIRECT_FIELDS: [&str; 26] = [
    "id",
    "species_guess",
    "iconic_taxon_name",
    "num_identification_agreements",
    "num_identification_disagreements",
    "observed_on_string",
    "observed_on",
    "time_observed_at",
    "place_guess",
    "positional_accuracy",
    "id_please",
    "private_place_guess",
    "private_latitude",
    "private_longitude",
    "private_positional_accuracy",
    "geoprivacy",
    "taxon_geoprivacy",
    "positioning_method",
    "positioning_device",
    "out_of_range",
    "tracking_code",
    "created_at",
    "updated_at",
    "quality_grade",
    "description",
    "oauth_application_id",
];

/// Role name that marks an identification as authoritative
const CURATOR_ROLE: &str = "curator";

/// The core flattener that extracts flat records from nested observations
#[derive(Debug, Default)]
pub struct ObservationFlattener;

impl ObservationFlattener {
    pub fn new() -> Self {
        ObservationFlattener
    }

    /// Flatten a batch of observations, dropping the ones that fail
    ///
    /// One malformed observation never aborts the batch: its error is logged
    /// with the record's position and id, and the remaining observations are
    /// still processed. Output order equals input order minus the dropped
    /// records.
    pub fn flatten_batch(&self, observations: &[Value]) -> Vec<FlatRecord> {
        let mut records = Vec::with_capacity(observations.len());

        for (position, observation) in observations.iter().enumerate() {
            match self.flatten_record(observation) {
                Ok(record) => records.push(record),
                Err(err) => {
                    error!(
                        "Dropping observation {} at position {}: {}",
                        observation_id(observation),
                        position,
                        err
                    );
                }
            }
        }

        records
    }

    /// Flatten a single observation into a flat record
    pub fn flatten_record(&self, observation: &Value) -> Result<FlatRecord, FlattenError> {
        let obs = as_object(observation, "observation")?;
        debug!("Flattening observation {}", observation_id(observation));

        let mut record = FlatRecord::new();

        let taxon = as_object(require(obs, "taxon")?, "taxon")?;
        record.insert("scientific_name", require(taxon, "taxon.name")?.clone());
        record.insert("taxon_id", require(taxon, "taxon.id")?.clone());

        // The input key differs from the output column here
        record.insert("time_zone", require(obs, "created_time_zone")?.clone());

        let geojson = as_object(require(obs, "geojson")?, "geojson")?;
        let (latitude, longitude) = point_coordinates(geojson)?;
        record.insert("latitude", latitude);
        record.insert("longitude", longitude);

        record.insert("coordinates_obscured", require(obs, "obscured")?.clone());

        let user = as_object(require(obs, "user")?, "user")?;
        record.insert("user_id", require(user, "user.id")?.clone());
        record.insert("user_login", require(user, "user.login")?.clone());

        record.insert("license", require(obs, "license_code")?.clone());

        let id = require(obs, "id")?;
        record.insert(
            "url",
            Value::String(format!(
                "http://www.inaturalist.org/observations/{}",
                scalar_text(id)
            )),
        );

        record.insert("image_url", photo_url(taxon)?);

        let sounds = as_array(require(obs, "sounds")?, "sounds")?;
        record.insert("sound_url", sound_url(sounds)?);

        let tags = as_array(require(obs, "tags")?, "tags")?;
        record.insert("tag_list", tag_list(tags)?);

        record.insert("captive_cultivated", require(obs, "captive")?.clone());

        record.insert(
            "curator_coordinate_access",
            curator_coordinate_access(obs)?,
        );

        // Species-level identifications may lack a common name; the key is
        // omitted (not nulled) so projection decides the final shape.
        if let Some(common_name) = taxon.get("preferred_common_name") {
            record.insert("common_name", common_name.clone());
        }

        for &field in DIRECT_FIELDS.iter() {
            record.insert(field, obs.get(field).cloned().unwrap_or(Value::Null));
        }

        let identifications = as_array(require(obs, "identifications")?, "identifications")?;
        apply_curator_identification(&mut record, identifications)?;

        let ofvs = as_array(require(obs, "ofvs")?, "ofvs")?;
        for (index, ofv) in ofvs.iter().enumerate() {
            let ofv = as_object(ofv, &format!("ofvs[{index}]"))?;
            let name = require(ofv, &format!("ofvs[{index}].name"))?;
            let name = as_str(name, &format!("ofvs[{index}].name"))?;
            let value = require(ofv, &format!("ofvs[{index}].value"))?.clone();
            record.insert(format!("field:{}", name.to_lowercase()), value);
        }

        Ok(record)
    }
}

/// Latitude/longitude from a geojson location, null for non-point geometries
///
/// The source stores coordinates longitude-first; the output swaps them.
fn point_coordinates(geojson: &Map<String, Value>) -> Result<(Value, Value), FlattenError> {
    let is_point = geojson.get("type").and_then(Value::as_str) == Some("Point");
    if !is_point {
        return Ok((Value::Null, Value::Null));
    }

    let coordinates = as_array(require(geojson, "geojson.coordinates")?, "geojson.coordinates")?;
    let longitude = coordinates
        .first()
        .ok_or_else(|| FlattenError::missing("geojson.coordinates[0]"))?;
    let latitude = coordinates
        .get(1)
        .ok_or_else(|| FlattenError::missing("geojson.coordinates[1]"))?;

    Ok((latitude.clone(), longitude.clone()))
}

/// Medium-resolution URL of the taxon's default photo, null when it has none
fn photo_url(taxon: &Map<String, Value>) -> Result<Value, FlattenError> {
    match taxon.get("default_photo") {
        Some(photo) => {
            let photo = as_object(photo, "taxon.default_photo")?;
            Ok(require(photo, "taxon.default_photo.medium_url")?.clone())
        }
        None => Ok(Value::Null),
    }
}

/// File URL of the first sound, null when the observation has no sounds
fn sound_url(sounds: &[Value]) -> Result<Value, FlattenError> {
    match sounds.first() {
        Some(first) => {
            let first = as_object(first, "sounds[0]")?;
            Ok(require(first, "sounds[0].file_url")?.clone())
        }
        None => Ok(Value::Null),
    }
}

/// Tags joined with ", ", null when the observation has no tags
fn tag_list(tags: &[Value]) -> Result<Value, FlattenError> {
    if tags.is_empty() {
        return Ok(Value::Null);
    }

    let mut names = Vec::with_capacity(tags.len());
    for (index, tag) in tags.iter().enumerate() {
        names.push(as_str(tag, &format!("tags[{index}]"))?);
    }

    Ok(Value::String(names.join(", ")))
}

/// Curator-coordinate-access preference of the first project observation
///
/// An empty `project_observations` sequence is a per-record failure, not a
/// defaulted value.
fn curator_coordinate_access(obs: &Map<String, Value>) -> Result<Value, FlattenError> {
    let project_observations =
        as_array(require(obs, "project_observations")?, "project_observations")?;
    let first = project_observations
        .first()
        .ok_or_else(|| FlattenError::missing("project_observations[0]"))?;
    let first = as_object(first, "project_observations[0]")?;
    let preferences = as_object(
        require(first, "project_observations[0].preferences")?,
        "project_observations[0].preferences",
    )?;

    Ok(require(
        preferences,
        "project_observations[0].preferences.allows_curator_coordinate_access",
    )?
    .clone())
}

/// Populate the curator_ident_* fields from the first curator identification
///
/// Identifications are scanned in their given order and the scan stops at the
/// first user holding the curator role. With no curator match the four keys
/// stay absent and project to null.
fn apply_curator_identification(
    record: &mut FlatRecord,
    identifications: &[Value],
) -> Result<(), FlattenError> {
    for (index, identification) in identifications.iter().enumerate() {
        let path = format!("identifications[{index}]");
        let identification = as_object(identification, &path)?;

        let user = as_object(require(identification, &format!("{path}.user"))?, &format!("{path}.user"))?;
        let roles = as_array(
            require(user, &format!("{path}.user.roles"))?,
            &format!("{path}.user.roles"),
        )?;

        if !roles.iter().any(|role| role.as_str() == Some(CURATOR_ROLE)) {
            continue;
        }

        let taxon = as_object(
            require(identification, &format!("{path}.taxon"))?,
            &format!("{path}.taxon"),
        )?;
        record.insert("curator_ident_taxon_id", require(taxon, &format!("{path}.taxon.id"))?.clone());
        record.insert(
            "curator_ident_taxon_name",
            require(taxon, &format!("{path}.taxon.name"))?.clone(),
        );
        record.insert("curator_ident_user_id", require(user, &format!("{path}.user.id"))?.clone());
        record.insert(
            "curator_ident_user_login",
            require(user, &format!("{path}.user.login"))?.clone(),
        );
        break;
    }

    Ok(())
}

/// Look up the last path segment in an object, erroring with the full path
fn require<'a>(obj: &'a Map<String, Value>, path: &str) -> Result<&'a Value, FlattenError> {
    let key = path.rsplit('.').next().unwrap_or(path);
    obj.get(key).ok_or_else(|| FlattenError::missing(path))
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, FlattenError> {
    value
        .as_object()
        .ok_or_else(|| FlattenError::wrong_type(path, "object"))
}

fn as_array<'a>(value: &'a Value, path: &str) -> Result<&'a Vec<Value>, FlattenError> {
    value
        .as_array()
        .ok_or_else(|| FlattenError::wrong_type(path, "array"))
}

fn as_str<'a>(value: &'a Value, path: &str) -> Result<&'a str, FlattenError> {
    value
        .as_str()
        .ok_or_else(|| FlattenError::wrong_type(path, "string"))
}

/// Render a scalar without JSON string quoting, for URLs and log lines
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn observation_id(observation: &Value) -> String {
    observation
        .get("id")
        .map(scalar_text)
        .unwrap_or_else(|| String::from("<no id>"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base_observation() -> Value {
        json!({
            "id": 41234567,
            "created_time_zone": "Eastern Time (US & Canada)",
            "obscured": false,
            "captive": false,
            "license_code": "CC-BY-NC",
            "taxon": {
                "id": 4956,
                "name": "Grus americana",
                "preferred_common_name": "Whooping Crane"
            },
            "user": {"id": 77, "login": "craner"},
            "geojson": {"type": "Point", "coordinates": [-80.1, 25.8]},
            "sounds": [],
            "tags": [],
            "identifications": [],
            "project_observations": [
                {"preferences": {"allows_curator_coordinate_access": true}}
            ],
            "ofvs": []
        })
    }

    #[test]
    fn test_basic_extraction() {
        let flattener = ObservationFlattener::new();
        let record = flattener.flatten_record(&base_observation()).unwrap();

        assert_eq!(record.get("scientific_name").unwrap(), "Grus americana");
        assert_eq!(record.get("taxon_id").unwrap(), 4956);
        assert_eq!(record.get("common_name").unwrap(), "Whooping Crane");
        assert_eq!(record.get("time_zone").unwrap(), "Eastern Time (US & Canada)");
        assert_eq!(record.get("user_id").unwrap(), 77);
        assert_eq!(record.get("user_login").unwrap(), "craner");
        assert_eq!(record.get("license").unwrap(), "CC-BY-NC");
        assert_eq!(record.get("coordinates_obscured").unwrap(), false);
        assert_eq!(record.get("captive_cultivated").unwrap(), false);
        assert_eq!(record.get("curator_coordinate_access").unwrap(), true);
        assert_eq!(
            record.get("url").unwrap(),
            "http://www.inaturalist.org/observations/41234567"
        );
    }

    #[test]
    fn test_point_coordinates_swap_to_latitude_longitude() {
        let flattener = ObservationFlattener::new();
        let record = flattener.flatten_record(&base_observation()).unwrap();

        assert_eq!(record.get("latitude").unwrap(), 25.8);
        assert_eq!(record.get("longitude").unwrap(), -80.1);
    }

    #[test]
    fn test_non_point_geojson_yields_nulls() {
        let mut observation = base_observation();
        observation["geojson"] = json!({"type": "Polygon", "coordinates": [[-80.1, 25.8]]});

        let flattener = ObservationFlattener::new();
        let record = flattener.flatten_record(&observation).unwrap();

        assert_eq!(record.get("latitude").unwrap(), &Value::Null);
        assert_eq!(record.get("longitude").unwrap(), &Value::Null);
    }

    #[test]
    fn test_missing_taxon_fails_the_record() {
        let mut observation = base_observation();
        observation.as_object_mut().unwrap().remove("taxon");

        let flattener = ObservationFlattener::new();
        let err = flattener.flatten_record(&observation).unwrap_err();

        assert_eq!(err, FlattenError::missing("taxon"));
    }

    #[test]
    fn test_batch_drops_only_the_malformed_record() {
        let mut malformed = base_observation();
        malformed.as_object_mut().unwrap().remove("taxon");

        let flattener = ObservationFlattener::new();
        let records =
            flattener.flatten_batch(&[base_observation(), malformed, base_observation()]);

        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_common_name_key_omitted_when_absent() {
        let mut observation = base_observation();
        observation["taxon"]
            .as_object_mut()
            .unwrap()
            .remove("preferred_common_name");

        let flattener = ObservationFlattener::new();
        let record = flattener.flatten_record(&observation).unwrap();

        assert!(!record.contains("common_name"));
    }

    #[test]
    fn test_image_url_from_default_photo() {
        let mut observation = base_observation();
        observation["taxon"]["default_photo"] =
            json!({"medium_url": "https://static.example.org/photos/1/medium.jpg"});

        let flattener = ObservationFlattener::new();
        let record = flattener.flatten_record(&observation).unwrap();
        assert_eq!(
            record.get("image_url").unwrap(),
            "https://static.example.org/photos/1/medium.jpg"
        );

        let record = flattener.flatten_record(&base_observation()).unwrap();
        assert_eq!(record.get("image_url").unwrap(), &Value::Null);
    }

    #[test]
    fn test_sound_url_uses_first_sound() {
        let mut observation = base_observation();
        observation["sounds"] = json!([
            {"file_url": "https://static.example.org/sounds/9.wav"},
            {"file_url": "https://static.example.org/sounds/10.wav"}
        ]);

        let flattener = ObservationFlattener::new();
        let record = flattener.flatten_record(&observation).unwrap();
        assert_eq!(
            record.get("sound_url").unwrap(),
            "https://static.example.org/sounds/9.wav"
        );

        let record = flattener.flatten_record(&base_observation()).unwrap();
        assert_eq!(record.get("sound_url").unwrap(), &Value::Null);
    }

    #[test]
    fn test_tag_list_joins_with_comma_space() {
        let mut observation = base_observation();
        observation["tags"] = json!(["wetland", "bird"]);

        let flattener = ObservationFlattener::new();
        let record = flattener.flatten_record(&observation).unwrap();
        assert_eq!(record.get("tag_list").unwrap(), "wetland, bird");

        let record = flattener.flatten_record(&base_observation()).unwrap();
        assert_eq!(record.get("tag_list").unwrap(), &Value::Null);
    }

    #[test]
    fn test_first_curator_identification_wins() {
        let mut observation = base_observation();
        observation["identifications"] = json!([
            {
                "user": {"id": 1, "login": "amateur", "roles": ["member"]},
                "taxon": {"id": 100, "name": "Grus grus"}
            },
            {
                "user": {"id": 2, "login": "expert", "roles": ["curator", "member"]},
                "taxon": {"id": 4956, "name": "Grus americana"}
            },
            {
                "user": {"id": 3, "login": "late_expert", "roles": ["curator"]},
                "taxon": {"id": 999, "name": "Grus canadensis"}
            }
        ]);

        let flattener = ObservationFlattener::new();
        let record = flattener.flatten_record(&observation).unwrap();

        assert_eq!(record.get("curator_ident_taxon_id").unwrap(), 4956);
        assert_eq!(record.get("curator_ident_taxon_name").unwrap(), "Grus americana");
        assert_eq!(record.get("curator_ident_user_id").unwrap(), 2);
        assert_eq!(record.get("curator_ident_user_login").unwrap(), "expert");
    }

    #[test]
    fn test_no_curator_identification_leaves_keys_absent() {
        let mut observation = base_observation();
        observation["identifications"] = json!([
            {
                "user": {"id": 1, "login": "amateur", "roles": ["member"]},
                "taxon": {"id": 100, "name": "Grus grus"}
            }
        ]);

        let flattener = ObservationFlattener::new();
        let record = flattener.flatten_record(&observation).unwrap();

        assert!(!record.contains("curator_ident_taxon_id"));
        assert!(!record.contains("curator_ident_user_login"));
    }

    #[test]
    fn test_custom_field_names_are_lowercased() {
        let mut observation = base_observation();
        observation["ofvs"] = json!([
            {"name": "Count", "value": "3"},
            {"name": "Crane Behavior", "value": "foraging"}
        ]);

        let flattener = ObservationFlattener::new();
        let record = flattener.flatten_record(&observation).unwrap();

        assert_eq!(record.get("field:count").unwrap(), "3");
        assert_eq!(record.get("field:crane behavior").unwrap(), "foraging");
    }

    #[test]
    fn test_empty_project_observations_fails_the_record() {
        let mut observation = base_observation();
        observation["project_observations"] = json!([]);

        let flattener = ObservationFlattener::new();
        let err = flattener.flatten_record(&observation).unwrap_err();

        assert_eq!(err, FlattenError::missing("project_observations[0]"));
    }

    #[test]
    fn test_direct_fields_default_to_null() {
        let mut observation = base_observation();
        observation["quality_grade"] = json!("research");

        let flattener = ObservationFlattener::new();
        let record = flattener.flatten_record(&observation).unwrap();

        assert_eq!(record.get("quality_grade").unwrap(), "research");
        assert_eq!(record.get("species_guess").unwrap(), &Value::Null);
        assert_eq!(record.get("tracking_code").unwrap(), &Value::Null);
    }
}
