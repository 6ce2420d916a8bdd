#![warn(missing_docs)]
//! # balatro-advisor binary
//!
//! Desktop entry point for balatro-advisor.

/// Process entry point.
fn main() {
    #[cfg(windows)]
    {
        if let Err(error) = win32_ui::run_main_window() {
            eprintln!("failed to start balatro-advisor UI: {error}");
            std::process::exit(1);
        }
    }

    #[cfg(not(windows))]
    {
        let config = balatro_advisor_app::AdvisorConfig::from_env();
        println!("balatro-advisor {}", balatro_advisor_app::app_version());
        println!(
            "window_title={:?} endpoint={} model={} timeout_secs={}",
            config.window_title,
            config.endpoint,
            config.model,
            config.request_timeout.as_secs()
        );
        println!("the advisor window requires Windows");
    }
}

#[cfg(windows)]
mod win32_ui {
    //! Native Win32 shell: three analysis buttons, a read-only output pane and
    //! a status line. Analyses run on one worker thread.

    use std::cell::RefCell;
    use std::ffi::c_void;
    use std::ptr::{null, null_mut};

    use balatro_advisor_app::logging::{executable_dir, init_run_logging};
    use balatro_advisor_app::worker::AnalysisWorker;
    use balatro_advisor_app::{
        AdvisorConfig, AdvisorError, app_version, apply_analysis_result, run_configured_analysis,
        to_crlf,
    };
    use balatro_advisor_core::AnalysisKind;
    use balatro_advisor_ui::{APP_DESCRIPTION, APP_TITLE, UiState};
    use tracing::{error, info};
    use windows_sys::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
    use windows_sys::Win32::Graphics::Gdi::COLOR_WINDOW;
    use windows_sys::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows_sys::Win32::UI::Input::KeyboardAndMouse::EnableWindow;
    use windows_sys::Win32::UI::WindowsAndMessaging::{
        BN_CLICKED, BS_PUSHBUTTON, CS_HREDRAW, CS_VREDRAW, CW_USEDEFAULT, CreateWindowExW,
        DefWindowProcW, DispatchMessageW, ES_AUTOVSCROLL, ES_MULTILINE, ES_READONLY, GetMessageW,
        IDC_ARROW, LoadCursorW, MSG, PostMessageW, PostQuitMessage, RegisterClassW, SS_CENTER,
        SW_SHOW, SetWindowTextW, ShowWindow, TranslateMessage, WM_APP, WM_COMMAND, WM_DESTROY,
        WNDCLASSW, WS_BORDER, WS_CHILD, WS_OVERLAPPEDWINDOW, WS_TABSTOP, WS_VISIBLE, WS_VSCROLL,
    };

    const CONTROL_ID_HAND_BUTTON: i32 = 1001;
    const CONTROL_ID_SHOP_BUTTON: i32 = 1002;
    const CONTROL_ID_STATE_BUTTON: i32 = 1003;
    const CONTROL_ID_OUTPUT_EDIT: i32 = 1004;

    const WINDOW_WIDTH: i32 = 820;
    const WINDOW_HEIGHT: i32 = 700;
    const MARGIN: i32 = 40;
    const CONTENT_WIDTH: i32 = 720;
    const BUTTON_WIDTH: i32 = 240;
    const BUTTON_HEIGHT: i32 = 36;
    const WM_ANALYSIS_WORKER_EVENT: u32 = WM_APP + 1;

    std::thread_local! {
        static APP_CONTROLLER: RefCell<Option<AppController>> = const { RefCell::new(None) };
    }

    struct ControlHandles {
        hand_button: HWND,
        shop_button: HWND,
        state_button: HWND,
        output_edit: HWND,
        status_label: HWND,
    }

    impl Default for ControlHandles {
        fn default() -> Self {
            Self {
                hand_button: null_mut(),
                shop_button: null_mut(),
                state_button: null_mut(),
                output_edit: null_mut(),
                status_label: null_mut(),
            }
        }
    }

    struct AppController {
        ui_state: UiState,
        config: AdvisorConfig,
        controls: ControlHandles,
        worker: Option<AnalysisWorker>,
    }

    impl AppController {
        fn new(config: AdvisorConfig) -> Self {
            Self {
                ui_state: UiState::new(app_version()),
                config,
                controls: ControlHandles::default(),
                worker: None,
            }
        }
    }

    /// Starts the UI event loop and blocks until the user closes the window.
    pub fn run_main_window() -> Result<(), String> {
        let log_dir = executable_dir().map_err(|error| error.to_string())?;
        let log_path = init_run_logging(&log_dir).map_err(|error| error.to_string())?;

        let config = AdvisorConfig::from_env();
        info!(
            version = app_version(),
            log_file = %log_path.display(),
            window_title = %config.window_title,
            endpoint = %config.endpoint,
            model = %config.model,
            "startup"
        );

        APP_CONTROLLER.with(|slot| {
            *slot.borrow_mut() = Some(AppController::new(config));
        });

        let instance = unsafe {
            // Safety:
            // - Passing null requests the current process module instance handle.
            GetModuleHandleW(null())
        };
        if instance.is_null() {
            let message = "GetModuleHandleW returned null".to_string();
            error!(%message, "module handle unavailable");
            return Err(message);
        }

        let class_name = to_wide("BalatroAdvisorMainWindowClass");
        let cursor = unsafe {
            // Safety:
            // - Uses predefined system cursor identifier.
            LoadCursorW(null_mut(), IDC_ARROW)
        };

        let window_class = WNDCLASSW {
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(window_proc),
            hInstance: instance,
            lpszClassName: class_name.as_ptr(),
            hCursor: cursor,
            hbrBackground: (COLOR_WINDOW as usize + 1) as *mut c_void,
            ..unsafe {
                // Safety:
                // - Zero-initialization for unused optional fields is valid.
                std::mem::zeroed()
            }
        };

        let atom = unsafe {
            // Safety:
            // - `window_class` is fully initialized and points to stable memory.
            RegisterClassW(&window_class)
        };
        if atom == 0 {
            let message = "RegisterClassW failed".to_string();
            error!(%message, "window class registration failed");
            return Err(message);
        }

        let title = to_wide(APP_TITLE);
        let hwnd = unsafe {
            // Safety:
            // - Class and title pointers are valid for the call.
            // - `instance` is a process module handle returned by Win32.
            CreateWindowExW(
                0,
                class_name.as_ptr(),
                title.as_ptr(),
                WS_OVERLAPPEDWINDOW | WS_VISIBLE,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                WINDOW_WIDTH,
                WINDOW_HEIGHT,
                null_mut(),
                null_mut(),
                instance,
                null_mut(),
            )
        };
        if hwnd.is_null() {
            let message = "CreateWindowExW failed".to_string();
            error!(%message, "main window creation failed");
            return Err(message);
        }

        create_ui_controls(hwnd, instance)?;

        unsafe {
            // Safety:
            // - `hwnd` is a valid window handle created above.
            ShowWindow(hwnd, SW_SHOW);
        }

        refresh_view()?;

        info!("message loop started");
        let mut message: MSG = unsafe {
            // Safety:
            // - Zero-initialization before first `GetMessageW` is valid.
            std::mem::zeroed()
        };

        loop {
            let result = unsafe {
                // Safety:
                // - `message` pointer remains valid across loop iterations.
                GetMessageW(&mut message, null_mut(), 0, 0)
            };
            if result == -1 {
                let message = "GetMessageW returned -1".to_string();
                error!(%message, "message loop failed");
                return Err(message);
            }
            if result == 0 {
                info!("WM_QUIT received");
                break;
            }

            unsafe {
                // Safety:
                // - `message` contents came from `GetMessageW`.
                TranslateMessage(&message);
                DispatchMessageW(&message);
            }
        }

        Ok(())
    }

    extern "system" fn window_proc(
        hwnd: HWND,
        message: u32,
        w_param: WPARAM,
        l_param: LPARAM,
    ) -> LRESULT {
        match message {
            WM_COMMAND => {
                handle_command(hwnd, w_param);
                0
            }
            WM_ANALYSIS_WORKER_EVENT => {
                handle_worker_events();
                0
            }
            WM_DESTROY => {
                let _ = with_controller_mut(|controller| {
                    if let Some(worker) = controller.worker.take() {
                        worker.detach();
                    }
                    Ok(())
                });
                info!("window destroyed; posting quit");
                unsafe {
                    // Safety:
                    // - Ends the message loop on main thread.
                    PostQuitMessage(0);
                }
                0
            }
            _ => unsafe {
                // Safety:
                // - Delegate unhandled messages to default Win32 behavior.
                DefWindowProcW(hwnd, message, w_param, l_param)
            },
        }
    }

    fn create_ui_controls(hwnd: HWND, instance: *mut c_void) -> Result<(), String> {
        with_controller_mut(|controller| {
            let mut controls = ControlHandles::default();

            let label_style = WS_CHILD | WS_VISIBLE | SS_CENTER as u32;
            let button_style = WS_CHILD | WS_VISIBLE | WS_TABSTOP | BS_PUSHBUTTON as u32;
            let output_style = WS_CHILD
                | WS_VISIBLE
                | WS_BORDER
                | WS_VSCROLL
                | ES_MULTILINE as u32
                | ES_READONLY as u32
                | ES_AUTOVSCROLL as u32;

            let _title = create_child_control(
                hwnd,
                instance,
                "STATIC",
                APP_TITLE,
                label_style,
                MARGIN,
                20,
                CONTENT_WIDTH,
                32,
                0,
            )?;

            let _description = create_child_control(
                hwnd,
                instance,
                "STATIC",
                APP_DESCRIPTION,
                label_style,
                MARGIN,
                58,
                CONTENT_WIDTH,
                24,
                0,
            )?;

            let button_x = MARGIN + (CONTENT_WIDTH - BUTTON_WIDTH) / 2;
            let mut button_y = 98;
            let mut buttons = Vec::with_capacity(AnalysisKind::ALL.len());
            for kind in AnalysisKind::ALL {
                buttons.push(create_child_control(
                    hwnd,
                    instance,
                    "BUTTON",
                    kind.button_label(),
                    button_style,
                    button_x,
                    button_y,
                    BUTTON_WIDTH,
                    BUTTON_HEIGHT,
                    control_id_for_kind(kind),
                )?);
                button_y += BUTTON_HEIGHT + 12;
            }
            controls.hand_button = buttons[0];
            controls.shop_button = buttons[1];
            controls.state_button = buttons[2];

            controls.output_edit = create_child_control(
                hwnd,
                instance,
                "EDIT",
                "",
                output_style,
                MARGIN,
                button_y + 8,
                CONTENT_WIDTH,
                WINDOW_HEIGHT - button_y - 110,
                CONTROL_ID_OUTPUT_EDIT,
            )?;

            controls.status_label = create_child_control(
                hwnd,
                instance,
                "STATIC",
                "",
                WS_CHILD | WS_VISIBLE,
                MARGIN,
                WINDOW_HEIGHT - 90,
                CONTENT_WIDTH,
                22,
                0,
            )?;

            controller.controls = controls;
            info!("controls created");
            Ok(())
        })
    }

    fn handle_command(hwnd: HWND, w_param: WPARAM) {
        let control_id = loword(w_param) as i32;
        let notification = hiword(w_param) as u32;
        if notification != BN_CLICKED as u32 {
            return;
        }

        let Some(kind) = kind_for_control_id(control_id) else {
            return;
        };

        if let Err(message) = handle_analysis_click(hwnd, kind) {
            error!(kind = kind.as_str(), %message, "analysis click failed");
        }

        let _ = refresh_view();
    }

    fn handle_analysis_click(hwnd: HWND, kind: AnalysisKind) -> Result<(), String> {
        with_controller_mut(|controller| {
            if !controller.ui_state.begin_action(kind) {
                info!(kind = kind.as_str(), "click ignored; analysis in flight");
                return Ok(());
            }

            match submit_analysis(controller, hwnd, kind) {
                Ok(()) => {
                    set_buttons_enabled(&controller.controls, false);
                    info!(kind = kind.as_str(), "analysis queued");
                }
                Err(error) => {
                    error!(kind = kind.as_str(), error = %error, "analysis dispatch failed");
                    apply_analysis_result(&mut controller.ui_state, Err(error));
                    set_buttons_enabled(&controller.controls, true);
                }
            }
            Ok(())
        })
    }

    fn submit_analysis(
        controller: &mut AppController,
        hwnd: HWND,
        kind: AnalysisKind,
    ) -> Result<(), AdvisorError> {
        let worker = match controller.worker.take() {
            Some(worker) => worker,
            None => spawn_analysis_worker(hwnd, controller.config.clone())?,
        };
        worker.submit(kind)?;
        controller.worker = Some(worker);
        Ok(())
    }

    fn handle_worker_events() {
        let _ = with_controller_mut(|controller| {
            let Some(worker) = controller.worker.as_ref() else {
                return Ok(());
            };

            match worker.drain() {
                Ok(events) => {
                    for event in events {
                        let outcome =
                            apply_analysis_result(&mut controller.ui_state, event.result);
                        info!(kind = event.kind.as_str(), ?outcome, "analysis displayed");
                    }
                }
                Err(error) => {
                    error!(error = %error, "worker event drain failed");
                    controller.worker = None;
                    apply_analysis_result(&mut controller.ui_state, Err(error));
                }
            }

            set_buttons_enabled(&controller.controls, !controller.ui_state.is_busy());
            Ok(())
        });

        let _ = refresh_view();
    }

    fn refresh_view() -> Result<(), String> {
        with_controller_mut(|controller| {
            set_control_text(
                controller.controls.status_label,
                &format!(
                    "{}    (v{})",
                    controller.ui_state.status_text(),
                    controller.ui_state.version
                ),
            );
            set_control_text(
                controller.controls.output_edit,
                &to_crlf(controller.ui_state.output()),
            );
            Ok(())
        })
    }

    fn set_buttons_enabled(controls: &ControlHandles, enabled: bool) {
        let flag = i32::from(enabled);
        for button in [
            controls.hand_button,
            controls.shop_button,
            controls.state_button,
        ] {
            unsafe {
                // Safety:
                // - Button handles are live children of the main window.
                EnableWindow(button, flag);
            }
        }
    }

    fn spawn_analysis_worker(
        hwnd: HWND,
        config: AdvisorConfig,
    ) -> Result<AnalysisWorker, AdvisorError> {
        let hwnd_value = hwnd as isize;
        AnalysisWorker::spawn(
            move |kind| run_configured_analysis(&config, kind),
            move || notify_worker_event(hwnd_value),
        )
    }

    fn notify_worker_event(hwnd_value: isize) {
        unsafe {
            // Safety:
            // - Posts a custom message to the UI thread queue; no pointers are transferred.
            PostMessageW(hwnd_value as HWND, WM_ANALYSIS_WORKER_EVENT, 0, 0);
        }
    }

    fn with_controller_mut<F, T>(f: F) -> Result<T, String>
    where
        F: FnOnce(&mut AppController) -> Result<T, String>,
    {
        APP_CONTROLLER.with(|slot| {
            let mut maybe_controller = slot.borrow_mut();
            let controller = maybe_controller
                .as_mut()
                .ok_or_else(|| "app controller is not initialized".to_string())?;
            f(controller)
        })
    }

    fn control_id_for_kind(kind: AnalysisKind) -> i32 {
        match kind {
            AnalysisKind::Hand => CONTROL_ID_HAND_BUTTON,
            AnalysisKind::Shop => CONTROL_ID_SHOP_BUTTON,
            AnalysisKind::GameState => CONTROL_ID_STATE_BUTTON,
        }
    }

    fn kind_for_control_id(control_id: i32) -> Option<AnalysisKind> {
        AnalysisKind::ALL
            .into_iter()
            .find(|kind| control_id_for_kind(*kind) == control_id)
    }

    #[allow(clippy::too_many_arguments)]
    fn create_child_control(
        parent: HWND,
        instance: *mut c_void,
        class_name: &str,
        text: &str,
        style: u32,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        control_id: i32,
    ) -> Result<HWND, String> {
        let class_name_wide = to_wide(class_name);
        let text_wide = to_wide(text);

        let hwnd = unsafe {
            // Safety:
            // - Input pointers are stable for this call and parent/instance handles are valid.
            CreateWindowExW(
                0,
                class_name_wide.as_ptr(),
                text_wide.as_ptr(),
                style,
                x,
                y,
                width,
                height,
                parent,
                control_id as usize as *mut c_void,
                instance,
                null(),
            )
        };

        if hwnd.is_null() {
            return Err(format!(
                "failed to create control class={class_name} id={control_id}"
            ));
        }

        Ok(hwnd)
    }

    fn set_control_text(control: HWND, text: &str) {
        let wide = to_wide(text);
        unsafe {
            // Safety:
            // - `control` is a live child HWND and UTF-16 pointer is valid for call.
            SetWindowTextW(control, wide.as_ptr());
        }
    }

    fn loword(value: usize) -> u16 {
        (value & 0xFFFF) as u16
    }

    fn hiword(value: usize) -> u16 {
        ((value >> 16) & 0xFFFF) as u16
    }

    fn to_wide(value: &str) -> Vec<u16> {
        value.encode_utf16().chain(std::iter::once(0)).collect()
    }
}
