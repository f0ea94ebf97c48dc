/// HTTP binding for the generation service
///
/// Every operation is `POST {base}/v1/{operation}` with a JSON body.
/// Image operations answer `{"images": [...]}`, text operations
/// `{"text": "..."}`. Video is asynchronous: the POST returns an operation
/// id that is polled until it reports `done`.

use async_trait::async_trait;
use url::Url;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

use super::*;
use crate::error::StudioError;

const API_PREFIX: &str = "v1/";
const VIDEO_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Give up on a clip after this many polls (one hour)
const VIDEO_MAX_POLLS: u32 = 720;

pub struct HttpGenerationService {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    images: Vec<String>,
}

#[derive(Deserialize)]
struct TextResponse {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct OperationStarted {
    operation: String,
}

#[derive(Deserialize)]
struct OperationStatus {
    #[serde(default)]
    done: bool,
    progress: Option<String>,
    video_url: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl HttpGenerationService {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, StudioError> {
        let mut url = Url::parse(base_url)
            .map_err(|e| StudioError::Config(format!("invalid service URL '{base_url}': {e}")))?;
        // Url::join replaces the last segment unless the path ends with '/'
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .build()
            .map_err(|e| StudioError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: url,
            api_key,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        self.base_url
            .join(API_PREFIX)
            .and_then(|url| url.join(path))
            .map_err(|e| ServiceError::Decode(format!("bad endpoint '{path}': {e}")))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn post<B, R>(&self, operation: &str, body: &B) -> Result<R, ServiceError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.endpoint(operation)?;
        tracing::debug!("POST {url}");
        let response = self.authorize(self.http.post(url)).json(body).send().await?;
        decode(response).await
    }

    async fn post_images<B: Serialize + Sync>(&self, operation: &str, body: &B) -> Result<Vec<ImageUrl>, ServiceError> {
        let response: ImagesResponse = self.post(operation, body).await?;
        Ok(response.images.into_iter().map(as_data_url).collect())
    }

    async fn post_text<B: Serialize + Sync>(&self, operation: &str, body: &B) -> Result<String, ServiceError> {
        let response: TextResponse = self.post(operation, body).await?;
        Ok(response.text)
    }

    async fn poll_operation(&self, id: &str) -> Result<OperationStatus, ServiceError> {
        let url = self.endpoint(&format!("operations/{id}"))?;
        let response = self.authorize(self.http.get(url)).send().await?;
        decode(response).await
    }
}

/// Check the status and parse the JSON body
async fn decode<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, ServiceError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or_else(|_| body.trim().to_string());
        return Err(ServiceError::Status {
            status: status.as_u16(),
            message,
        });
    }
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ServiceError::Decode(e.to_string()))
}

/// Services may answer with bare base64; the studio works with data URLs
fn as_data_url(image: String) -> ImageUrl {
    if image.starts_with("data:") || image.starts_with("http") {
        image
    } else {
        format!("data:image/png;base64,{image}")
    }
}

#[async_trait]
impl GenerationService for HttpGenerationService {
    async fn generate_images(&self, request: &ImageRequest) -> Result<Vec<ImageUrl>, ServiceError> {
        self.post_images("images", request).await
    }

    async fn edit_image(&self, request: &EditRequest) -> Result<Vec<ImageUrl>, ServiceError> {
        self.post_images("edit", request).await
    }

    async fn merge_images(&self, request: &MergeRequest) -> Result<Vec<ImageUrl>, ServiceError> {
        self.post_images("merge", request).await
    }

    async fn generate_video(
        &self,
        request: &VideoRequest,
        progress: &(dyn for<'s> Fn(&'s str) + Send + Sync),
    ) -> Result<String, ServiceError> {
        let started: OperationStarted = self.post("video", request).await?;
        tracing::info!("🎬 Video operation {} started", started.operation);
        progress("Video generation started...");

        for _ in 0..VIDEO_MAX_POLLS {
            tokio::time::sleep(VIDEO_POLL_INTERVAL).await;
            let status = self.poll_operation(&started.operation).await?;
            if let Some(error) = status.error {
                return Err(ServiceError::Failed(error));
            }
            if status.done {
                return status
                    .video_url
                    .ok_or_else(|| ServiceError::Decode("finished operation has no video_url".into()));
            }
            if let Some(line) = status.progress {
                progress(&line);
            }
        }
        Err(ServiceError::Failed("video generation did not finish in time".into()))
    }

    async fn generate_prompt_from_image(&self, request: &AnalysisRequest) -> Result<String, ServiceError> {
        self.post_text("prompt-from-image", request).await
    }

    async fn generate_prompt_from_plan(&self, request: &AnalysisRequest) -> Result<String, ServiceError> {
        self.post_text("prompt-from-plan", request).await
    }

    async fn generate_architectural_prompts(&self, request: &AnalysisRequest) -> Result<String, ServiceError> {
        self.post_text("architectural-prompts", request).await
    }

    async fn place_and_render_furniture(
        &self,
        request: &FurnitureRequest,
    ) -> Result<Vec<ImageUrl>, ServiceError> {
        self.post_images("furniture", request).await
    }

    async fn generate_moodboard(&self, request: &MoodboardRequest) -> Result<Vec<ImageUrl>, ServiceError> {
        self.post_images("moodboard", request).await
    }

    async fn apply_lighting(&self, request: &LightingRequest) -> Result<Vec<ImageUrl>, ServiceError> {
        self.post_images("lighting", request).await
    }

    async fn extend_view(&self, request: &ExtendViewRequest) -> Result<Vec<ImageUrl>, ServiceError> {
        self.post_images("extend-view", request).await
    }

    async fn upscale_image(&self, request: &UpscaleRequest) -> Result<Vec<ImageUrl>, ServiceError> {
        self.post_images("upscale", request).await
    }

    async fn generate_style_change_prompt(&self, request: &BriefRequest) -> Result<String, ServiceError> {
        self.post_text("style-change-prompt", request).await
    }

    async fn generate_video_script_prompt(&self, request: &BriefRequest) -> Result<String, ServiceError> {
        self.post_text("video-script-prompt", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(base: &str) -> HttpGenerationService {
        HttpGenerationService::new(base, None, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoints_keep_base_path() {
        let svc = service("https://api.example.com/studio");
        assert_eq!(
            svc.endpoint("images").unwrap().as_str(),
            "https://api.example.com/studio/v1/images"
        );
        assert_eq!(
            svc.endpoint("operations/abc").unwrap().as_str(),
            "https://api.example.com/studio/v1/operations/abc"
        );
        assert_eq!(
            service("http://localhost:8080").endpoint("extend-view").unwrap().as_str(),
            "http://localhost:8080/v1/extend-view"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpGenerationService::new("not a url", None, Duration::from_secs(1)),
            Err(StudioError::Config(_))
        ));
    }

    #[test]
    fn test_bare_base64_becomes_data_url() {
        assert_eq!(as_data_url("AAAA".into()), "data:image/png;base64,AAAA");
        assert_eq!(as_data_url("data:image/jpeg;base64,AA".into()), "data:image/jpeg;base64,AA");
    }

    #[test]
    fn test_status_body_parsing() {
        let status: OperationStatus =
            serde_json::from_str(r#"{"done": false, "progress": "40%"}"#).unwrap();
        assert!(!status.done);
        assert_eq!(status.progress.as_deref(), Some("40%"));
        assert_eq!(status.video_url, None);

        let images: ImagesResponse = serde_json::from_str("{}").unwrap();
        assert!(images.images.is_empty());
    }
}
