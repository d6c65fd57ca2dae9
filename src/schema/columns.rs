/// The canonical output column order the export format guarantees
///
/// Every exported row has exactly these columns in this order. The six
/// `field:` entries are the only custom-field columns that survive
/// projection; any other custom field an observation carries is dropped.
/// This is a deliberate whitelist, not an open schema.
pub const CANONICAL_COLUMNS: [&str; 52] = [
    "id",
    "species_guess",
    "scientific_name",
    "common_name",
    "iconic_taxon_name",
    "taxon_id",
    "id_please",
    "num_identification_agreements",
    "num_identification_disagreements",
    "observed_on_string",
    "observed_on",
    "time_observed_at",
    "time_zone",
    "place_guess",
    "latitude",
    "longitude",
    "positional_accuracy",
    "private_place_guess",
    "private_latitude",
    "private_longitude",
    "private_positional_accuracy",
    "geoprivacy",
    "taxon_geoprivacy",
    "coordinates_obscured",
    "positioning_method",
    "positioning_device",
    "out_of_range",
    "user_id",
    "user_login",
    "created_at",
    "updated_at",
    "quality_grade",
    "license",
    "url",
    "image_url",
    "sound_url",
    "tag_list",
    "description",
    "oauth_application_id",
    "captive_cultivated",
    "curator_ident_taxon_id",
    "curator_ident_taxon_name",
    "curator_ident_user_id",
    "curator_ident_user_login",
    "tracking_code",
    "curator_coordinate_access",
    "field:count",
    "field:distance to animal",
    "field:whooping crane habitat",
    "field:list of hazards present",
    "field:crane behavior",
    "field:well-being",
];
