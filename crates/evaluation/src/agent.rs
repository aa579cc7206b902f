//! Driving agents for the local closed loop.

use std::collections::HashMap;

use contracts::{Frame, VehicleControl};

/// Maps the latest sensor frames to a control command, once per tick.
pub trait DrivingAgent: Send {
    /// # Arguments
    /// * `input` - Latest decoded frame per sensor name
    /// * `timestamp` - Seconds since the loop started
    fn run_step(&mut self, input: &HashMap<String, Frame>, timestamp: f64) -> VehicleControl;

    /// Release resources at the end of the run
    fn destroy(&mut self) {}
}

/// Applies the same command every tick.
///
/// Brakes until every required sensor has delivered a frame.
#[derive(Debug, Clone)]
pub struct ConstantAgent {
    control: VehicleControl,
    required: Vec<String>,
    steps: u64,
}

impl ConstantAgent {
    pub fn new(control: VehicleControl) -> Self {
        Self {
            control,
            required: Vec::new(),
            steps: 0,
        }
    }

    pub fn requiring<I, S>(mut self, sensors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = sensors.into_iter().map(Into::into).collect();
        self
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }
}

impl DrivingAgent for ConstantAgent {
    fn run_step(&mut self, input: &HashMap<String, Frame>, _timestamp: f64) -> VehicleControl {
        self.steps += 1;
        if self.required.iter().all(|name| input.contains_key(name)) {
            self.control
        } else {
            VehicleControl::stop()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::FrameData;
    use ndarray::Array2;

    fn lidar_frame() -> Frame {
        Frame {
            frame_id: 1,
            timestamp: 0.0,
            data: FrameData::Points(Array2::zeros((4, 4))),
        }
    }

    #[test]
    fn test_constant_control() {
        let mut agent = ConstantAgent::new(VehicleControl::new(0.5, 0.1, 0.0));
        let control = agent.run_step(&HashMap::new(), 0.0);
        assert_eq!(control, VehicleControl::new(0.5, 0.1, 0.0));
        assert_eq!(agent.steps(), 1);
    }

    #[test]
    fn test_brakes_until_required_sensors_arrive() {
        let mut agent =
            ConstantAgent::new(VehicleControl::new(0.5, 0.0, 0.0)).requiring(["lidar"]);
        assert_eq!(agent.run_step(&HashMap::new(), 0.0), VehicleControl::stop());

        let input = HashMap::from([("lidar".to_string(), lidar_frame())]);
        assert_eq!(agent.run_step(&input, 0.1).throttle, 0.5);
    }
}
