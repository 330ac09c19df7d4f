//! Location report validation
//!
//! First stage of the ingest pipeline: checks field presence and coordinate
//! ranges before anything touches the persistence port. Rejection here means
//! no store call and no broadcast, only an error reply to the caller.
//!
//! Validation does not consult the active-vehicle set; tracking activation
//! and location ingestion are independent concerns.

use crate::error::{Error, Result};
use crate::protocol::message::{LocationUpdateData, TrackVehicleData};

/// A validated, transient location report
///
/// Ownership passes to the persistence port immediately after validation;
/// the relay never stores it.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationReport {
    pub vehicle_id: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Validate a `location_update` payload
pub fn validate(data: &LocationUpdateData) -> Result<LocationReport> {
    let (Some(vehicle_id), Some(latitude), Some(longitude)) =
        (&data.vehicle_id, data.latitude, data.longitude)
    else {
        return Err(Error::Validation(
            "Vehicle ID, latitude, and longitude are required".into(),
        ));
    };

    if vehicle_id.is_empty() {
        return Err(Error::Validation(
            "Vehicle ID, latitude, and longitude are required".into(),
        ));
    }

    if !(-90.0..=90.0).contains(&latitude) {
        return Err(Error::Validation(
            "Latitude must be between -90 and 90".into(),
        ));
    }

    if !(-180.0..=180.0).contains(&longitude) {
        return Err(Error::Validation(
            "Longitude must be between -180 and 180".into(),
        ));
    }

    Ok(LocationReport {
        vehicle_id: vehicle_id.clone(),
        latitude,
        longitude,
    })
}

/// Extract the vehicle id of a `start_tracking` / `stop_tracking` payload
pub(crate) fn required_vehicle_id(data: &TrackVehicleData) -> Result<String> {
    match &data.vehicle_id {
        Some(id) if !id.is_empty() => Ok(id.clone()),
        _ => Err(Error::Validation("Vehicle ID is required".into())),
    }
}
