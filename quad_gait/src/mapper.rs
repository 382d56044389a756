//! (leg, axis) to servo resolution and angle-to-unit conversion.

use quad_common::consts::SERVO_COUNT;
use quad_common::driver::{DriverError, ServoDriver};
use quad_common::servo::ServoTable;
use quad_common::types::{Axis, Leg, RawUnit, ServoId};

/// Resolves joints to servos and converts angles to trimmed raw units.
#[derive(Debug, Clone, PartialEq)]
pub struct ServoMapper {
    servos: ServoTable,
    trims: [RawUnit; SERVO_COUNT],
}

impl ServoMapper {
    /// Build from a validated servo table.
    pub fn new(servos: &ServoTable) -> Self {
        let mut trims = [0; SERVO_COUNT];
        for cfg in servos.iter() {
            trims[cfg.id.index()] = cfg.trim;
        }
        Self {
            servos: servos.clone(),
            trims,
        }
    }

    /// Servo driving `axis` of `leg`.
    #[inline]
    pub fn leg_axis_to_id(&self, leg: Leg, axis: Axis) -> ServoId {
        self.servos.id_for(leg, axis)
    }

    /// Trim of servo `id` [raw units].
    #[inline]
    pub fn trim(&self, id: ServoId) -> RawUnit {
        self.trims[id.index()]
    }

    /// Driver conversion of `angle`, then trim.
    #[inline]
    pub fn to_unit(&self, driver: &dyn ServoDriver, id: ServoId, angle: f64) -> RawUnit {
        driver.angle_to_unit(angle).saturating_add(self.trim(id))
    }

    /// Convert `angle` and write it to servo `id`. Returns the unit written.
    pub fn write(
        &self,
        driver: &mut dyn ServoDriver,
        id: ServoId,
        angle: f64,
    ) -> Result<RawUnit, DriverError> {
        let unit = self.to_unit(driver, id, angle);
        driver.write(id, unit)?;
        Ok(unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quad_common::config::{BusConfig, ServoMode};
    use std::collections::HashSet;

    /// Ten units per degree, records the last write.
    #[derive(Default)]
    struct DeciDegreeDriver {
        last: Option<(ServoId, RawUnit)>,
    }

    impl ServoDriver for DeciDegreeDriver {
        fn name(&self) -> &'static str {
            "deci"
        }
        fn version(&self) -> &'static str {
            "0.0.0"
        }
        fn init(&mut self, _bus: &BusConfig) -> Result<(), DriverError> {
            Ok(())
        }
        fn initialize(&mut self, _: ServoId, _: ServoMode, _: u16, _: u16) -> Result<(), DriverError> {
            Ok(())
        }
        fn angle_to_unit(&self, angle_degrees: f64) -> RawUnit {
            (angle_degrees * 10.0).round() as RawUnit
        }
        fn write(&mut self, id: ServoId, position: RawUnit) -> Result<(), DriverError> {
            self.last = Some((id, position));
            Ok(())
        }
        fn read_voltage(&mut self, _: ServoId) -> Result<f64, DriverError> {
            Ok(0.0)
        }
    }

    #[test]
    fn joint_mapping_is_a_bijection() {
        let mapper = ServoMapper::new(&ServoTable::builtin());
        let ids: HashSet<ServoId> = Leg::ALL
            .iter()
            .flat_map(|&leg| Axis::ALL.map(|axis| mapper.leg_axis_to_id(leg, axis)))
            .collect();
        assert_eq!(ids.len(), SERVO_COUNT);
        assert_eq!(ids, ServoId::all().collect::<HashSet<_>>());
    }

    #[test]
    fn builtin_joint_assignment() {
        let mapper = ServoMapper::new(&ServoTable::builtin());
        assert_eq!(mapper.leg_axis_to_id(Leg::FrontLeft, Axis::Horizontal).get(), 1);
        assert_eq!(mapper.leg_axis_to_id(Leg::FrontLeft, Axis::Vertical).get(), 2);
        assert_eq!(mapper.leg_axis_to_id(Leg::RearRight, Axis::Horizontal).get(), 7);
        assert_eq!(mapper.leg_axis_to_id(Leg::RearRight, Axis::Vertical).get(), 8);
    }

    #[test]
    fn trim_is_added_after_conversion() {
        let mapper = ServoMapper::new(&ServoTable::builtin());
        let driver = DeciDegreeDriver::default();
        let id3 = ServoId::new(3).unwrap();
        // 80° -> 800, trim 140
        assert_eq!(mapper.to_unit(&driver, id3, 80.0), 940);
        let id5 = ServoId::new(5).unwrap();
        assert_eq!(mapper.to_unit(&driver, id5, 60.0), 600);
    }

    #[test]
    fn write_delegates_converted_unit() {
        let mapper = ServoMapper::new(&ServoTable::builtin());
        let mut driver = DeciDegreeDriver::default();
        let id1 = ServoId::new(1).unwrap();
        let unit = mapper.write(&mut driver, id1, 100.0).unwrap();
        assert_eq!(unit, 1100);
        assert_eq!(driver.last, Some((id1, 1100)));
    }
}
