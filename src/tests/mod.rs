use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use tower::ServiceExt;

use crate::{
    admin::{
        history::InMemoryAdminHistory,
        photo::{NoticeDispatch, PhotoAdmin},
        AdminRequest,
    },
    auth::{
        permissions::InMemoryPermissionRegistry, GroupId, InMemoryUserDirectory, Principal,
        UserId,
    },
    email::{services::TestEmailService, templates::create_templates, EmailSender},
    event_log::InMemoryEventLog,
    models::photo::queries::InMemoryPhotoStore,
    notification::{EmailNotifier, InMemorySettings, NoticeType, DEFAULT_NOTICE_TEMPLATES},
    requests::RequestContext,
    server::{create_routes, ServerState, ServerStateInner},
    storage::Storage,
};

pub const NOTICE_TYPE: &str = "photo_saved";

/// An app wired to in-memory collaborators, with a few users already registered.
pub struct TestApp {
    pub state: ServerState,
    pub router: Router,
    pub store: Arc<InMemoryPhotoStore>,
    pub permissions: Arc<InMemoryPermissionRegistry>,
    pub event_log: Arc<InMemoryEventLog>,
    pub history: Arc<InMemoryAdminHistory>,
    pub settings: Arc<InMemorySettings>,
    pub storage: Arc<Storage>,
    /// Emails sent by the notifier
    pub emails: Arc<TestEmailService>,

    /// A superuser
    pub admin: Arc<Principal>,
    pub admin_key: String,
    /// A staff user with no groups
    pub staff: Arc<Principal>,
    pub staff_key: String,
    /// A staff user in [TestApp::group]
    pub other_staff: Arc<Principal>,
    pub other_staff_key: String,
    /// An active user without admin site access
    pub member_key: String,
    pub group: GroupId,
}

fn principal(username: &str, is_staff: bool, is_superuser: bool, groups: Vec<GroupId>) -> Principal {
    Principal {
        id: UserId::new(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        active: true,
        is_staff,
        is_superuser,
        groups,
    }
}

/// Start an app that sends notices.
pub async fn start_app() -> TestApp {
    build_app(true)
}

/// Start an app with no notifier configured.
pub async fn start_app_without_notices() -> TestApp {
    build_app(false)
}

fn build_app(with_notices: bool) -> TestApp {
    crate::tracing_config::test::init();

    let store = Arc::new(InMemoryPhotoStore::new());
    let permissions = Arc::new(InMemoryPermissionRegistry::new());
    let event_log = Arc::new(InMemoryEventLog::new());
    let history = Arc::new(InMemoryAdminHistory::new());
    let settings = Arc::new(InMemorySettings::new());
    let storage = Arc::new(Storage::new_in_memory());
    let emails = Arc::new(TestEmailService::new());

    let notices = with_notices.then(|| {
        let templates = create_templates(DEFAULT_NOTICE_TEMPLATES.iter().copied())
            .expect("creating templates");
        let sender = EmailSender::new(
            "site@example.com".to_string(),
            Arc::new(templates),
            emails.clone(),
        );
        NoticeDispatch {
            notifier: Arc::new(EmailNotifier::new(Arc::new(sender))),
            notice_type: NoticeType::new(NOTICE_TYPE),
        }
    });

    let photo_admin = PhotoAdmin::builder()
        .store(store.clone())
        .permissions(permissions.clone())
        .event_log(event_log.clone())
        .history(history.clone())
        .storage(storage.clone())
        .settings(settings.clone())
        .notices(notices)
        .build();

    let group = GroupId::new();
    let admin = principal("admin", true, true, vec![]);
    let staff = principal("staff", true, false, vec![]);
    let other_staff = principal("other_staff", true, false, vec![group]);
    let member = principal("member", false, false, vec![]);

    let users = Arc::new(InMemoryUserDirectory::new());
    users.add("admin-key", admin.clone());
    users.add("staff-key", staff.clone());
    users.add("other-staff-key", other_staff.clone());
    users.add("member-key", member);

    let state = ServerState::new(ServerStateInner {
        production: false,
        photo_admin,
        users,
        event_log: event_log.clone(),
    });
    let router = create_routes(state.clone(), std::time::Duration::from_secs(30));

    TestApp {
        state,
        router,
        store,
        permissions,
        event_log,
        history,
        settings,
        storage,
        emails,
        admin: Arc::new(admin),
        admin_key: "admin-key".to_string(),
        staff: Arc::new(staff),
        staff_key: "staff-key".to_string(),
        other_staff: Arc::new(other_staff),
        other_staff_key: "other-staff-key".to_string(),
        member_key: "member-key".to_string(),
        group,
    }
}

impl TestApp {
    pub fn photo_admin(&self) -> &PhotoAdmin {
        &self.state.photo_admin
    }

    /// An [AdminRequest] for `user`, as if it came in through `method` and `path`.
    pub fn admin_request(&self, user: &Arc<Principal>, method: &str, path: &str) -> AdminRequest {
        AdminRequest {
            user: user.clone(),
            context: RequestContext {
                method: method.to_string(),
                path: path.to_string(),
                remote_addr: Some("127.0.0.1".to_string()),
                user_agent: Some("test-agent".to_string()),
            },
        }
    }

    /// Set the recipients of notices.
    pub fn set_recipients(&self, value: &str) {
        let (scope, scope_category, name) = crate::admin::photo::NOTICE_RECIPIENTS_SETTING;
        self.settings.set(scope, scope_category, name, value);
    }

    pub fn sent_emails(&self) -> Vec<crate::email::Email> {
        self.emails.emails.lock().unwrap().clone()
    }

    /// Send a request through the router, returning the status and the parsed JSON body.
    /// An empty body is returned as `Value::Null`.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        api_key: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder()
            .method(method)
            .uri(path)
            .header(header::AUTHORIZATION, format!("Bearer {api_key}"));

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                serde_json::Value::String(String::from_utf8_lossy(&bytes).to_string())
            })
        };

        (status, body)
    }
}
