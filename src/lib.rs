// Rover drive runtime: motor-driver board protocol, kinematics,
// odometry and the stdin/stdout control loop.

pub mod config;
pub mod messages;
pub mod motor;
pub mod odometry;
pub mod runtime;
pub mod telemetry;
pub mod transport;
