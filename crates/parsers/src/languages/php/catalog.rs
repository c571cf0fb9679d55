use std::collections::HashSet;

use crate::catalog::Catalog;

fn set(names: &[&str]) -> HashSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

pub fn load_catalog() -> Catalog {
    Catalog {
        security_checks: set(&[
            "current_user_can",
            "wp_verify_nonce",
            "check_ajax_referer",
            "check_admin_referer",
        ]),
        sensitive_functions: set(&[
            "update_option",
            "add_option",
            "delete_option",
            "update_site_option",
            "delete_site_option",
            "wp_insert_post",
            "wp_update_post",
            "wp_delete_post",
            "wp_trash_post",
            "add_post_meta",
            "update_post_meta",
            "delete_post_meta",
            "update_user_meta",
            "delete_user_meta",
            "wp_insert_user",
            "wp_update_user",
            "wp_delete_user",
            "delete_user",
            "wp_set_password",
            "wp_set_current_user",
            "wp_insert_comment",
            "wp_delete_comment",
            "wp_delete_attachment",
            "wp_handle_upload",
            "media_handle_upload",
            "activate_plugin",
            "deactivate_plugins",
            "switch_theme",
            "wp_mail",
            "file_put_contents",
            "fwrite",
            "unlink",
            "rmdir",
            "rename",
            "move_uploaded_file",
            "setcookie",
        ]),
        sensitive_prefixes: vec!["wp_send_json".into()],
        sensitive_methods: set(&[
            "query",
            "insert",
            "update",
            "delete",
            "replace",
            "get_results",
            "get_var",
            "get_row",
            "get_col",
        ]),
        sensitive_keywords: set(&["echo", "print"]),
    }
}
