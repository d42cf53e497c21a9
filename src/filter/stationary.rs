use nalgebra::Vector3;

use crate::{error::Error, filter::Filter, snapshot::StateSnapshot};

/// Declares the vehicle at rest on its home point, for bench operation
/// without GPS: position and velocity are forced to zero every cycle.
#[derive(Debug, Default, Clone)]
pub struct StationaryFilter {}

impl Filter for StationaryFilter {
    fn initialize(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn update(&mut self, snapshot: &mut StateSnapshot) -> Result<(), Error> {
        snapshot.position = Some(Vector3::zeros());
        snapshot.velocity = Some(Vector3::zeros());
        Ok(())
    }
}
