use crate::models::{EffectiveLimit, QuotaField, QuotaLimitSet, QuotaSource};

/// The override rows that apply to one request, plus the global defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuotaLayers {
    pub user: Option<QuotaLimitSet>,
    pub project: Option<QuotaLimitSet>,
    pub project_type: Option<QuotaLimitSet>,
    pub defaults: QuotaLimitSet,
}

impl QuotaLayers {
    /// Layers in precedence order, highest first.
    fn providers(&self) -> [(QuotaSource, Option<&QuotaLimitSet>); 4] {
        [
            (QuotaSource::User, self.user.as_ref()),
            (QuotaSource::Project, self.project.as_ref()),
            (QuotaSource::ProjectType, self.project_type.as_ref()),
            (QuotaSource::Default, Some(&self.defaults)),
        ]
    }

    /// First layer that sets `field` wins; a field no layer sets is unlimited.
    pub fn effective(&self, field: QuotaField) -> EffectiveLimit {
        self.providers()
            .into_iter()
            .find_map(|(source, layer)| {
                layer.and_then(|limits| limits.get(field)).map(|value| EffectiveLimit {
                    field,
                    value: Some(value),
                    source,
                })
            })
            .unwrap_or(EffectiveLimit {
                field,
                value: None,
                source: QuotaSource::Unlimited,
            })
    }

    pub fn resolve(&self) -> QuotaLimitSet {
        let mut resolved = QuotaLimitSet::default();
        for field in QuotaField::ALL {
            resolved.set(field, self.effective(field).value);
        }
        resolved
    }

    pub fn explain(&self) -> Vec<EffectiveLimit> {
        QuotaField::ALL
            .iter()
            .map(|field| self.effective(*field))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: i64 = 1024 * 1024;

    fn defaults() -> QuotaLimitSet {
        QuotaLimitSet::default()
            .with(QuotaField::PendingProjectsMax, 3)
            .with(QuotaField::TotalStorageMax, 200 * MB)
    }

    #[test]
    fn test_defaults_apply_when_no_override_is_set() {
        let layers = QuotaLayers {
            defaults: defaults(),
            ..Default::default()
        };

        let resolved = layers.resolve();
        assert_eq!(resolved.pending_projects_max, Some(3));
        assert_eq!(resolved.total_storage_max, Some(200 * MB));
        assert_eq!(resolved.file_size_max, None);
        assert_eq!(
            layers.effective(QuotaField::FileSizeMax).source,
            QuotaSource::Unlimited
        );
    }

    #[test]
    fn test_single_layer_setting_a_field_wins() {
        let single = QuotaLimitSet::default().with(QuotaField::PendingProjectsMax, 9);

        let cases = [
            (
                QuotaLayers { user: Some(single), defaults: defaults(), ..Default::default() },
                QuotaSource::User,
            ),
            (
                QuotaLayers { project: Some(single), defaults: defaults(), ..Default::default() },
                QuotaSource::Project,
            ),
            (
                QuotaLayers {
                    project_type: Some(single),
                    defaults: defaults(),
                    ..Default::default()
                },
                QuotaSource::ProjectType,
            ),
        ];

        for (layers, source) in cases {
            let effective = layers.effective(QuotaField::PendingProjectsMax);
            assert_eq!(effective.value, Some(9));
            assert_eq!(effective.source, source);
        }
    }

    #[test]
    fn test_user_override_beats_project_and_project_type() {
        let layers = QuotaLayers {
            user: Some(QuotaLimitSet::default().with(QuotaField::TotalStorageMax, 5 * MB)),
            project: Some(QuotaLimitSet::default().with(QuotaField::TotalStorageMax, 50 * MB)),
            project_type: Some(QuotaLimitSet::default().with(QuotaField::TotalStorageMax, 500 * MB)),
            defaults: defaults(),
        };

        assert_eq!(layers.resolve().total_storage_max, Some(5 * MB));
        assert_eq!(
            layers.effective(QuotaField::TotalStorageMax).source,
            QuotaSource::User
        );
    }

    #[test]
    fn test_project_beats_project_type() {
        let layers = QuotaLayers {
            project: Some(QuotaLimitSet::default().with(QuotaField::FileSizeMax, 10 * MB)),
            project_type: Some(QuotaLimitSet::default().with(QuotaField::FileSizeMax, 20 * MB)),
            defaults: defaults(),
            ..Default::default()
        };

        assert_eq!(layers.resolve().file_size_max, Some(10 * MB));
    }

    #[test]
    fn test_fields_fall_through_independently() {
        let layers = QuotaLayers {
            user: Some(QuotaLimitSet::default().with(QuotaField::FileSizeMax, MB)),
            project: Some(QuotaLimitSet::default().with(QuotaField::PendingProjectsMax, 1)),
            defaults: defaults(),
            ..Default::default()
        };

        let resolved = layers.resolve();
        assert_eq!(resolved.file_size_max, Some(MB));
        assert_eq!(resolved.pending_projects_max, Some(1));
        assert_eq!(resolved.total_storage_max, Some(200 * MB));
    }
}
