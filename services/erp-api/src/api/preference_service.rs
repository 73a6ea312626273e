//! PreferenceService：当前用户的偏好设置

use std::sync::Arc;

use bridge_bootstrap::{GrpcTimer, request_context};
use tonic::{Request, Response, Status};

use crate::application::PreferenceHandler;
use crate::erp::v1::preference_service_server::PreferenceService;
use crate::erp::v1::*;

use super::conversions::{optional_window, preference_to_proto};

const SERVICE: &str = "erp.v1.PreferenceService";

pub struct PreferenceServiceImpl {
    preferences: Arc<PreferenceHandler>,
}

impl PreferenceServiceImpl {
    pub fn new(preferences: Arc<PreferenceHandler>) -> Self {
        Self { preferences }
    }
}

#[tonic::async_trait]
impl PreferenceService for PreferenceServiceImpl {
    async fn get_preference(
        &self,
        request: Request<GetPreferenceRequest>,
    ) -> Result<Response<Preference>, Status> {
        let timer = GrpcTimer::start(SERVICE, "GetPreference");
        let result = async {
            let ctx = request_context(&request)?;
            let req = request.into_inner();
            let window = optional_window(req.ad_window_id)?;
            let entry = self.preferences.get(&ctx, &req.attribute, window).await?;
            Ok::<_, Status>(Response::new(preference_to_proto(entry)))
        }
        .await;
        timer.finish(result)
    }

    async fn set_preference(
        &self,
        request: Request<SetPreferenceRequest>,
    ) -> Result<Response<Preference>, Status> {
        let timer = GrpcTimer::start(SERVICE, "SetPreference");
        let result = async {
            let ctx = request_context(&request)?;
            let req = request.into_inner();
            let window = optional_window(req.ad_window_id)?;
            let entry = self
                .preferences
                .set(&ctx, &req.attribute, &req.value, window)
                .await?;
            Ok::<_, Status>(Response::new(preference_to_proto(entry)))
        }
        .await;
        timer.finish(result)
    }

    async fn delete_preference(
        &self,
        request: Request<DeletePreferenceRequest>,
    ) -> Result<Response<()>, Status> {
        let timer = GrpcTimer::start(SERVICE, "DeletePreference");
        let result = async {
            let ctx = request_context(&request)?;
            let req = request.into_inner();
            let window = optional_window(req.ad_window_id)?;
            self.preferences.delete(&ctx, &req.attribute, window).await?;
            Ok::<_, Status>(Response::new(()))
        }
        .await;
        timer.finish(result)
    }
}
