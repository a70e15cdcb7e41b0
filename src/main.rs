//! Demo: runs one scripted ride against the configured collaborators and
//! logs every state transition.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use ride_flow::adapters::{NominatimGeocoder, OsrmRoutingService, StraightLineRouting};
use ride_flow::application::{DriverSignal, RideFlowController};
use ride_flow::config::{AppConfig, RoutingProvider};
use ride_flow::domain::foundation::Coordinate;
use ride_flow::domain::ride::{LocationPoint, RideStateKind};
use ride_flow::ports::{GeocodingService, RoutingService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    ride_flow::telemetry::init(&config.telemetry)?;

    let routing: Arc<dyn RoutingService> = match config.routing.provider {
        RoutingProvider::StraightLine => Arc::new(
            StraightLineRouting::new().with_speed_mps(config.routing.average_speed_mps),
        ),
        RoutingProvider::Osrm => Arc::new(OsrmRoutingService::new(config.routing.osrm_config())?),
    };
    let mut builder = RideFlowController::builder(routing, Arc::new(config.backend.simulated()))
        .timings(config.flow.to_timings())
        .signal_buffer(config.flow.signal_buffer);
    if config.geocoding.enabled {
        let geocoder: Arc<dyn GeocodingService> =
            Arc::new(NominatimGeocoder::new(config.geocoding.nominatim_config())?);
        builder = builder.geocoder(geocoder);
    }
    let controller = builder.build();

    let mut transitions = controller.transitions();
    let printer = tokio::spawn(async move {
        loop {
            match transitions.recv().await {
                Ok(transition) => println!("{:>24} -> {}", transition.from, transition.to),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "transition log lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let pickup = LocationPoint::named(Coordinate::new(37.7749, -122.4194)?, "Market St");
    let destination = LocationPoint::named(Coordinate::new(37.8080, -122.4177)?, "Pier 39");
    controller.update_pickup(Some(pickup))?;
    controller.update_destination(Some(destination))?;
    let mut states = controller.subscribe();
    states
        .wait_for(|s| matches!(s.kind(), RideStateKind::RouteReady | RideStateKind::Error))
        .await?;
    if let Some(failure) = controller.current_state().failure() {
        warn!(error = %failure.kind(), "route calculation failed");
        return Ok(());
    }
    if let Some(route) = controller.route() {
        info!(
            distance_m = route.distance_meters(),
            travel_secs = route.expected_travel_time().as_secs(),
            "route ready"
        );
    }

    controller.request_ride().await?;
    if controller.current_state().kind() != RideStateKind::DriverEnRoute {
        warn!(state = %controller.current_state(), "ride did not reach a driver");
        return Ok(());
    }

    // Stand-in for the map layer animating the driver towards the pickup.
    let signals = controller.signal_channel()?;
    tokio::time::sleep(Duration::from_secs(1)).await;
    signals.send(DriverSignal::ReachedApproachThreshold).await?;
    tokio::time::sleep(Duration::from_secs(1)).await;
    signals.send(DriverSignal::ReachedPickup).await?;

    states
        .wait_for(|s| s.kind() == RideStateKind::RideCompleted)
        .await?;
    info!(ride_id = ?controller.ride_id().map(|id| id.to_string()), "demo ride finished");

    drop(controller);
    drop(signals);
    printer.abort();
    Ok(())
}
