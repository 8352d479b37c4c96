// Line-delimited control loop over stdin/stdout
//
// One command line is fully parsed, dispatched, responded and flushed
// before the next is read, so the bus sees a total order of effects and
// the supervisor gets strict request/response semantics. Every exit
// path — end-of-input, signal, or fault unwinding — leaves the motors
// stopped.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

use crate::config::DriveConfig;
use crate::messages::{KeySet, Request, Response};
use crate::motor::{DriveKinematics, MotorChannel, MotorDriver};
use crate::odometry::OdometryTracker;
use crate::telemetry;

/// Sequential dispatcher behind the line loop
pub struct ControlLoop {
    driver: MotorDriver,
    kinematics: DriveKinematics,
    odometry: OdometryTracker,
}

impl ControlLoop {
    /// Open the bus and push the motor profile to the board
    pub fn new(config: &DriveConfig) -> Result<Self, crate::motor::BusError> {
        let mut driver = MotorDriver::connect(config)?;
        driver.configure()?;

        let odometry = OdometryTracker::new(driver.profile());
        Ok(Self {
            driver,
            kinematics: DriveKinematics::new(config.base_speed, config.turn_factor),
            odometry,
        })
    }

    /// Process one request line into one response. Never panics on bad
    /// input; every failure becomes an error envelope.
    pub fn handle_line(&mut self, line: &str) -> Response {
        match Request::parse(line) {
            Ok(request) => self.dispatch(request),
            Err(e) => Response::error(e.to_string()),
        }
    }

    fn dispatch(&mut self, request: Request) -> Response {
        match request {
            Request::Move(keys) => self.handle_move(keys),
            Request::GetDistance => self.handle_distance(),
            Request::GetVoltage => self.handle_voltage(),
            Request::GetRoverPowerStats => self.handle_power_stats(),
        }
    }

    fn handle_move(&mut self, keys: KeySet) -> Response {
        let speeds = self.kinematics.wheel_speeds(keys.key_state());
        if let Err(e) = self.driver.apply_wheel_speeds(speeds) {
            // Safety-relevant write: surfaced, not swallowed. The next
            // line is still processed.
            return Response::error(e.to_string());
        }

        let voltage = telemetry::read_battery_voltage(&mut self.driver);
        Response::moved(speeds.left, speeds.right, keys, voltage.as_option())
    }

    fn handle_distance(&mut self) -> Response {
        match self.sample_distances() {
            Ok(values) => Response::distance(values),
            Err(e) => Response::error(e.to_string()),
        }
    }

    fn handle_voltage(&mut self) -> Response {
        self.refresh_odometry();
        let voltage = telemetry::read_battery_voltage(&mut self.driver);
        Response::voltage(voltage.as_option(), self.odometry.mean_total())
    }

    fn handle_power_stats(&mut self) -> Response {
        self.refresh_odometry();
        let voltage = telemetry::read_battery_voltage(&mut self.driver).as_option();
        let percentage = voltage.map(telemetry::battery_percentage);
        Response::power_stats(voltage, percentage, self.odometry.mean_total())
    }

    /// Sample all four accumulated counters and fold them into the
    /// tracker, returning the updated per-channel totals.
    fn sample_distances(&mut self) -> Result<[f64; 4], crate::motor::BusError> {
        let mut totals = [0.0; 4];
        for channel in MotorChannel::ALL {
            let ticks = self.driver.encoder_total(channel)?;
            totals[channel.index()] = self.odometry.record(channel, ticks);
        }
        Ok(totals)
    }

    /// Telemetry-path odometry refresh: degrades to the stale total on
    /// a bus failure instead of erroring.
    fn refresh_odometry(&mut self) {
        if let Err(e) = self.sample_distances() {
            warn!("Encoder refresh failed, serving stale distance: {}", e);
        }
    }

    /// Mandatory safety action for every exit path
    pub fn shutdown(&mut self) {
        if let Err(e) = self.driver.stop() {
            warn!("Safety stop failed: {}", e);
        }
    }
}

/// Run the control loop until end-of-input or an interruption signal.
pub async fn run(config: DriveConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut control = ControlLoop::new(&config)?;
    let result = serve(&mut control).await;

    // Reached on every path out of the loop; faults that unwind past
    // this point are covered by the driver's drop backstop.
    control.shutdown();
    result
}

async fn serve(
    control: &mut ControlLoop,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut sigterm = signal(SignalKind::terminate())?;

    info!("Control loop started, reading commands from stdin");

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let response = control.handle_line(&line);
                    let mut stdout = std::io::stdout().lock();
                    writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
                    stdout.flush()?;
                }
                Ok(None) => {
                    info!("End of input, stopping");
                    break;
                }
                Err(e) => {
                    warn!("Failed to read command line: {}", e);
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received, stopping");
                break;
            }
            _ = sigterm.recv() => {
                info!("Termination signal received, stopping");
                break;
            }
        }
    }

    Ok(())
}
